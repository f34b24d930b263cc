//! Passages: the unit of retrieval.
//!
//! A passage is one chunk of scraped biographical text plus the metadata of
//! the page it came from. Passages are produced by ingestion, persisted
//! alongside their embedding, and only ever read at query time.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Where a passage came from and who it is about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageMetadata {
    /// The saint or father the page is about (may be empty)
    #[serde(default)]
    pub name: String,

    /// Feast day as written on the source page (may be empty)
    #[serde(default)]
    pub feast_day: String,

    #[serde(default)]
    pub source_url: String,
}

/// A stored chunk of source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Deterministic content id (see [`Passage::new`])
    pub id: String,

    pub text: String,

    #[serde(default)]
    pub metadata: PassageMetadata,
}

impl Passage {
    /// Build the `chunk`-th passage of a document. The id is derived from
    /// source, position and text, so identical input always produces
    /// identical ids.
    pub fn new(text: impl Into<String>, metadata: PassageMetadata, chunk: usize) -> Self {
        let text = text.into();
        let mut hasher = Sha256::new();
        hasher.update(metadata.source_url.as_bytes());
        hasher.update([0u8]);
        hasher.update((chunk as u64).to_le_bytes());
        hasher.update(text.as_bytes());
        let digest = hasher.finalize();
        Self {
            id: hex::encode(&digest[..16]),
            text,
            metadata,
        }
    }
}

/// A passage with its similarity to a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPassage {
    pub passage: Passage,
    pub score: f32,
}

/// Passages ranked by non-increasing similarity, at most `k` of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub matches: Vec<ScoredPassage>,
}

impl RetrievalResult {
    /// Sort by descending score and keep the best `limit`.
    pub fn ranked(mut matches: Vec<ScoredPassage>, limit: usize) -> Self {
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);
        Self { matches }
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Numbered passage bodies separated by blank lines:
    ///
    /// ```text
    /// Source 1:
    /// <best passage>
    ///
    /// Source 2:
    /// <next passage>
    /// ```
    pub fn to_grounding_text(&self) -> String {
        self.matches
            .iter()
            .enumerate()
            .map(|(i, m)| format!("Source {}:\n{}", i + 1, m.passage.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(url: &str) -> PassageMetadata {
        PassageMetadata {
            name: "Saint Anthony".into(),
            feast_day: "January 17".into(),
            source_url: url.into(),
        }
    }

    fn scored(text: &str, score: f32) -> ScoredPassage {
        ScoredPassage {
            passage: Passage::new(text, meta("https://example.org/a"), 0),
            score,
        }
    }

    #[test]
    fn passage_id_is_deterministic() {
        let a = Passage::new("Anthony withdrew to the desert.", meta("https://a"), 3);
        let b = Passage::new("Anthony withdrew to the desert.", meta("https://a"), 3);
        assert_eq!(a.id, b.id);
        assert_eq!(a.id.len(), 32);
    }

    #[test]
    fn passage_id_depends_on_position() {
        let a = Passage::new("repeated boilerplate", meta("https://a"), 0);
        let b = Passage::new("repeated boilerplate", meta("https://a"), 1);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn passage_id_depends_on_source() {
        let a = Passage::new("same text", meta("https://a"), 0);
        let b = Passage::new("same text", meta("https://b"), 0);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn ranked_sorts_and_truncates() {
        let result = RetrievalResult::ranked(
            vec![scored("low", 0.1), scored("high", 0.9), scored("mid", 0.5)],
            2,
        );
        assert_eq!(result.len(), 2);
        assert_eq!(result.matches[0].passage.text, "high");
        assert_eq!(result.matches[1].passage.text, "mid");
    }

    #[test]
    fn grounding_text_is_numbered_and_blank_line_separated() {
        let result = RetrievalResult::ranked(vec![scored("first", 0.9), scored("second", 0.2)], 5);
        assert_eq!(
            result.to_grounding_text(),
            "Source 1:\nfirst\n\nSource 2:\nsecond"
        );
    }

    #[test]
    fn missing_metadata_fields_default() {
        let json = r#"{"id":"x","text":"t","metadata":{"name":"Basil"}}"#;
        let p: Passage = serde_json::from_str(json).unwrap();
        assert_eq!(p.metadata.name, "Basil");
        assert!(p.metadata.feast_day.is_empty());
    }
}
