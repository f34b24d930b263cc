//! The answering side of Synaxarion.
//!
//! A [`DomainExpert`] answers from one knowledge domain: it retrieves the
//! top passages and asks the model for a grounded answer. The [`Router`]
//! holds a session's history and offers every expert to the model as a
//! tool; the model decides whether to call one.
//!
//! [`Services`] wires both from configuration.

pub mod expert;
pub mod router;
pub mod services;

#[cfg(test)]
mod test_helpers;

pub use expert::{DomainExpert, EXPERT_SYSTEM_PROMPT, ExpertTool};
pub use router::{EMPTY_ANSWER_FALLBACK, Router, RouterReply, Session, ToolStep};
pub use services::{Domain, Services};
