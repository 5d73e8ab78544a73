//! Shared test doubles for stage tests.

use async_trait::async_trait;
use citewright_core::error::{ProviderError, ToolError};
use citewright_core::message::Message;
use citewright_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use citewright_core::tool::{KnowledgeLookup, WebSearch};
use citewright_memory::{FactMemory, HashEmbedder, InMemoryFactStore};
use std::sync::{Arc, Mutex};

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue and
/// records the request. Panics if more calls are made than responses
/// provided.
pub struct SequentialMockProvider {
    responses: Vec<Result<String, ProviderError>>,
    repeat_error: Option<ProviderError>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn texts(texts: &[&str]) -> Self {
        Self {
            responses: texts.iter().map(|t| Ok(t.to_string())).collect(),
            repeat_error: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self {
            responses: Vec::new(),
            repeat_error: Some(error),
            requests: Mutex::new(Vec::new()),
        }
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
        let model = request.model.clone();
        let mut requests = self.requests.lock().unwrap();
        let index = requests.len();
        requests.push(request);

        if let Some(err) = &self.repeat_error {
            return Err(err.clone());
        }

        let Some(scripted) = self.responses.get(index) else {
            panic!(
                "SequentialMockProvider: no more responses (call #{index}, have {})",
                self.responses.len()
            );
        };

        scripted.clone().map(|text| ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model,
        })
    }
}

/// Web search returning fixed text and recording queries.
pub struct MockSearch {
    result: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl MockSearch {
    pub fn new(result: &str) -> Self {
        Self {
            result: Some(result.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebSearch for MockSearch {
    fn name(&self) -> &str {
        "mock_search"
    }

    async fn search(&self, query: &str) -> Result<String, ToolError> {
        self.calls.lock().unwrap().push(query.to_string());
        self.result.clone().ok_or_else(|| ToolError::ExecutionFailed {
            tool_name: "mock_search".into(),
            reason: "HTTP 502".into(),
        })
    }
}

/// Encyclopedic lookup returning fixed text.
pub struct MockLookup {
    result: Option<String>,
}

impl MockLookup {
    pub fn new(result: &str) -> Self {
        Self {
            result: Some(result.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { result: None }
    }
}

#[async_trait]
impl KnowledgeLookup for MockLookup {
    fn name(&self) -> &str {
        "mock_lookup"
    }

    async fn lookup(&self, _query: &str) -> Result<String, ToolError> {
        self.result.clone().ok_or_else(|| ToolError::Timeout {
            tool_name: "mock_lookup".into(),
            timeout_secs: 30,
        })
    }
}

/// In-memory fact memory pre-loaded with `facts`.
pub async fn memory_with(facts: &[&str]) -> FactMemory {
    let memory = FactMemory::new(
        Arc::new(InMemoryFactStore::new()),
        Arc::new(HashEmbedder::default()),
    );
    for fact in facts {
        memory.store_fact(fact, "").await;
    }
    memory
}
