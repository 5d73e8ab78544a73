//! Tavily web search.
//!
//! One POST to `https://api.tavily.com/search` per query. Results are
//! rendered as plain-text blocks (title, URL, snippet) so the research
//! prompt can cite the URLs verbatim.

use async_trait::async_trait;
use citewright_core::error::ToolError;
use citewright_core::tool::WebSearch;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const TOOL_NAME: &str = "tavily_search";
const DEFAULT_ENDPOINT: &str = "https://api.tavily.com/search";

/// Returned instead of an empty string when the search finds nothing.
pub const NO_RESULTS: &str = "No search results found.";

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

pub struct TavilySearch {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    search_depth: String,
    max_results: usize,
    timeout_secs: u64,
}

impl TavilySearch {
    pub fn new(api_key: impl Into<String>) -> Self {
        let timeout_secs = 30;
        Self {
            client: build_client(timeout_secs),
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.into(),
            search_depth: "basic".into(),
            max_results: 5,
            timeout_secs,
        }
    }

    /// Set search depth ("basic" or "advanced").
    pub fn with_search_depth(mut self, depth: impl Into<String>) -> Self {
        self.search_depth = depth.into();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self.client = build_client(timeout_secs);
        self
    }

    /// Point at a different endpoint (self-hosted proxy, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn failed(reason: impl Into<String>) -> ToolError {
        ToolError::ExecutionFailed {
            tool_name: TOOL_NAME.into(),
            reason: reason.into(),
        }
    }
}

fn build_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Render results as blank-line separated blocks.
fn format_results(results: &[TavilyResult]) -> String {
    let blocks: Vec<String> = results
        .iter()
        .filter(|r| !r.url.trim().is_empty())
        .map(|r| {
            let title = if r.title.trim().is_empty() { r.url.as_str() } else { r.title.trim() };
            format!("{title}\n{}\n{}", r.url.trim(), r.content.trim())
        })
        .collect();

    if blocks.is_empty() {
        NO_RESULTS.to_string()
    } else {
        blocks.join("\n\n")
    }
}

#[async_trait]
impl WebSearch for TavilySearch {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    async fn search(&self, query: &str) -> Result<String, ToolError> {
        if query.trim().is_empty() {
            return Err(ToolError::InvalidArguments("empty search query".into()));
        }
        if self.api_key.trim().is_empty() {
            return Err(ToolError::NotConfigured("TAVILY_API_KEY is not set".into()));
        }

        let request = TavilyRequest {
            query,
            search_depth: &self.search_depth,
            max_results: self.max_results,
        };

        debug!(query, depth = %self.search_depth, max_results = self.max_results, "Tavily search");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ToolError::Timeout {
                        tool_name: TOOL_NAME.into(),
                        timeout_secs: self.timeout_secs,
                    }
                } else {
                    Self::failed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::failed(format!("Tavily API error {status}: {body}")));
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| Self::failed(format!("malformed response: {e}")))?;

        debug!(results = parsed.results.len(), "Tavily search complete");
        Ok(format_results(&parsed.results))
    }
}
