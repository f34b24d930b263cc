//! Domain experts: retrieve, then generate.
//!
//! An expert answers a question from one knowledge domain. It pulls the top
//! passages from its retrieval store, wraps them with the question in a
//! grounded prompt, and returns the model's completion verbatim. The router
//! sees each expert as a single-argument tool.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use synaxarion_core::error::ToolError;
use synaxarion_core::message::Message;
use synaxarion_core::provider::{Provider, ProviderRequest};
use synaxarion_core::tool::{Tool, ToolResult};
use synaxarion_core::Result;
use synaxarion_index::RetrievalStore;
use tracing::{debug, info};

/// Instruction given to every domain expert.
pub const EXPERT_SYSTEM_PROMPT: &str = "You are an expert on the lives of saints and spiritual \
fathers. Your purpose is to provide accurate, detailed information about saints, their lives, \
teachings, and spiritual wisdom. Use the RAG system to retrieve relevant information when \
needed. Always cite your sources when possible.";

pub struct DomainExpert {
    store: Arc<RetrievalStore>,
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    top_k: usize,
}

impl DomainExpert {
    pub fn new(
        store: Arc<RetrievalStore>,
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
    ) -> Self {
        let top_k = store.top_k();
        Self {
            store,
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            top_k,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn store(&self) -> &Arc<RetrievalStore> {
        &self.store
    }

    /// System instruction plus the question and its retrieved context.
    pub fn grounded_prompt(query: &str, retrieved: &str) -> Vec<Message> {
        vec![
            Message::system(EXPERT_SYSTEM_PROMPT),
            Message::user(format!(
                "Query: {query}\n\nRelevant information: {retrieved}"
            )),
        ]
    }

    /// Answer `query` from this domain's passages.
    ///
    /// Retrieval and generation failures propagate unchanged.
    pub async fn answer(&self, query: &str) -> Result<String> {
        let retrieved = self.store.query(query, self.top_k).await?;
        debug!(domain = %self.store.label(), chars = retrieved.len(), "Grounding context ready");

        let mut request =
            ProviderRequest::new(&self.model, Self::grounded_prompt(query, &retrieved));
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;

        let response = self.provider.complete(request).await?;
        info!(domain = %self.store.label(), model = %response.model, "Expert answered");
        Ok(response.message.content)
    }
}

/// Exposes a [`DomainExpert`] to the router as a callable capability.
pub struct ExpertTool {
    name: String,
    description: String,
    expert: Arc<DomainExpert>,
}

impl ExpertTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        expert: Arc<DomainExpert>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            expert,
        }
    }
}

#[async_trait]
impl Tool for ExpertTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The question to research in this domain"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<ToolResult, ToolError> {
        let query = arguments["query"]
            .as_str()
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("missing string argument 'query'".into()))?;

        let output = self
            .expert
            .answer(query)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name.clone(),
                reason: e.to_string(),
            })?;

        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use synaxarion_core::message::Role;

    #[tokio::test]
    async fn prompt_contains_query_and_retrieval() {
        let store = seeded_store(
            "saints",
            &[
                "Saint Example lived in the 4th century.",
                "A bishop who founded a monastery.",
            ],
        )
        .await;
        let provider = Arc::new(SequentialMockProvider::single_text("In the 4th century."));
        let expert = DomainExpert::new(store.clone(), provider.clone(), "gpt-3.5-turbo").with_top_k(1);

        let query = "When did Saint Example live?";
        let answer = expert.answer(query).await.unwrap();
        assert_eq!(answer, "In the 4th century.");

        let retrieved = store.query(query, 1).await.unwrap();
        assert!(retrieved.contains("4th century"));

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        let messages = &requests[0].messages;
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("expert on the lives of saints"));
        assert!(messages[1].content.contains(query));
        assert!(messages[1].content.contains(&retrieved));
        assert!(requests[0].tools.is_empty());
    }

    #[tokio::test]
    async fn empty_domain_grounds_on_not_initialized_message() {
        let provider = Arc::new(SequentialMockProvider::single_text("I do not know yet."));
        let expert = DomainExpert::new(empty_store("lives of the saints"), provider.clone(), "m");
        expert.answer("Who was Saint Brigid?").await.unwrap();

        let user = &provider.requests()[0].messages[1].content;
        assert!(user.ends_with(
            "Relevant information: The lives of the saints database has not been initialized yet."
        ));
    }

    #[tokio::test]
    async fn tool_schema_requires_query() {
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let expert = Arc::new(DomainExpert::new(empty_store("saints"), provider, "m"));
        let tool = ExpertTool::new("SaintsExpert", "Information about saints", expert);

        let def = tool.to_definition();
        assert_eq!(def.name, "SaintsExpert");
        assert_eq!(def.parameters["required"], json!(["query"]));
        assert_eq!(def.parameters["properties"]["query"]["type"], "string");
    }

    #[tokio::test]
    async fn tool_rejects_missing_query() {
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let expert = Arc::new(DomainExpert::new(empty_store("saints"), provider, "m"));
        let tool = ExpertTool::new("SaintsExpert", "d", expert);

        let err = tool.execute(json!({"question": "x"})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn tool_returns_expert_answer() {
        let provider = Arc::new(SequentialMockProvider::single_text("Saint Nicholas was a bishop."));
        let store = seeded_store("saints", &["Nicholas was bishop of Myra."]).await;
        let expert = Arc::new(DomainExpert::new(store, provider, "m"));
        let tool = ExpertTool::new("SaintsExpert", "d", expert);

        let result = tool.execute(json!({"query": "Who was the bishop of Myra?"})).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, "Saint Nicholas was a bishop.");
    }
}
