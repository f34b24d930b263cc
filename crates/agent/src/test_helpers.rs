//! Shared test helpers for expert and router tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use synaxarion_core::error::ProviderError;
use synaxarion_core::message::{Message, MessageToolCall};
use synaxarion_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use synaxarion_core::{EmbeddingProvider, IndexedPassage, Passage, PassageMetadata, VectorIndex};
use synaxarion_index::{InMemoryIndex, RetrievalStore};

/// A mock provider that returns a sequence of scripted responses and
/// records every request it receives.
///
/// Panics if more calls are made than responses provided.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn single_text(text: &str) -> Self {
        Self::new(vec![make_text_response(text)])
    }

    pub fn tool_then_answer(tool_calls: Vec<MessageToolCall>, answer: &str) -> Self {
        Self::new(vec![
            make_tool_call_response(tool_calls),
            make_text_response(answer),
        ])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let call = requests.len();

        if call >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{call}, have {})",
                responses.len()
            );
        }

        requests.push(request);
        Ok(responses[call].clone())
    }
}

pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

pub fn make_tool_call_response(tool_calls: Vec<MessageToolCall>) -> ProviderResponse {
    let mut response = make_text_response("");
    response.message.tool_calls = tool_calls;
    response
}

pub fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{name}"),
        name: name.to_string(),
        arguments: args.to_string(),
    }
}

/// Embeds text as counts of a fixed vocabulary, so related texts score high.
pub struct VocabularyEmbedder;

const VOCABULARY: [&str; 6] = ["century", "live", "desert", "bishop", "monastery", "martyr"];

#[async_trait]
impl EmbeddingProvider for VocabularyEmbedder {
    fn model(&self) -> &str {
        "vocabulary"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let lower = text.to_lowercase();
        let mut v: Vec<f32> = VOCABULARY
            .iter()
            .map(|w| lower.matches(w).count() as f32)
            .collect();
        v.push(0.01);
        Ok(v)
    }
}

/// A retrieval store over an in-memory index seeded with `texts`.
pub async fn seeded_store(label: &str, texts: &[&str]) -> Arc<RetrievalStore> {
    let index = Arc::new(InMemoryIndex::new());
    let embedder = VocabularyEmbedder;
    let mut entries = Vec::new();
    for (i, text) in texts.iter().enumerate() {
        entries.push(IndexedPassage {
            passage: Passage::new(*text, PassageMetadata::default(), i),
            embedding: embedder.embed(text).await.unwrap(),
        });
    }
    index.replace("vocabulary", entries).await.unwrap();
    Arc::new(RetrievalStore::new(label, Arc::new(VocabularyEmbedder), index))
}

/// A retrieval store with nothing ingested.
pub fn empty_store(label: &str) -> Arc<RetrievalStore> {
    Arc::new(RetrievalStore::new(
        label,
        Arc::new(VocabularyEmbedder),
        Arc::new(InMemoryIndex::new()),
    ))
}
