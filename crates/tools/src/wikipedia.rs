//! Wikipedia lookup via the MediaWiki action API.
//!
//! Two requests per lookup: a full-text search for page titles, then the
//! plain-text intro extracts of those pages. Output is a series of
//! `Page: <title>\nSummary: <extract>` blocks capped at `max_chars`.

use async_trait::async_trait;
use citewright_core::error::ToolError;
use citewright_core::tool::KnowledgeLookup;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const TOOL_NAME: &str = "wikipedia";

/// Returned when no page matches.
pub const NO_RESULT: &str = "No good Wikipedia Search Result was found";

pub struct WikipediaLookup {
    client: reqwest::Client,
    api_url: String,
    max_pages: usize,
    max_chars: usize,
    timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    query: Option<ExtractQuery>,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: HashMap<String, Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    extract: Option<String>,
}

impl WikipediaLookup {
    /// Lookup against the given language edition ("en", "de", ...).
    pub fn new(language: &str) -> Self {
        let timeout_secs = 30;
        Self {
            client: build_client(timeout_secs),
            api_url: format!("https://{language}.wikipedia.org/w/api.php"),
            max_pages: 3,
            max_chars: 4000,
            timeout_secs,
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self.client = build_client(timeout_secs);
        self
    }

    fn map_send_error(&self, e: reqwest::Error) -> ToolError {
        if e.is_timeout() {
            ToolError::Timeout {
                tool_name: TOOL_NAME.into(),
                timeout_secs: self.timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, params: &[(&str, &str)]) -> Result<T, ToolError> {
        let response = self
            .client
            .get(&self.api_url)
            .query(params)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("Wikipedia API returned {status}")));
        }

        response
            .json()
            .await
            .map_err(|e| failed(format!("malformed response: {e}")))
    }
}

fn failed(reason: impl Into<String>) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: TOOL_NAME.into(),
        reason: reason.into(),
    }
}

fn build_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("citewright/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Render pages in search-rank order and cap the total length.
fn format_pages(titles: &[String], pages: &HashMap<String, Page>, max_chars: usize) -> String {
    let by_title: HashMap<&str, &Page> = pages.values().map(|p| (p.title.as_str(), p)).collect();

    let blocks: Vec<String> = titles
        .iter()
        .filter_map(|t| by_title.get(t.as_str()))
        .filter_map(|p| {
            let extract = p.extract.as_deref()?.trim();
            (!extract.is_empty()).then(|| format!("Page: {}\nSummary: {extract}", p.title))
        })
        .collect();

    if blocks.is_empty() {
        return NO_RESULT.to_string();
    }
    truncate_chars(&blocks.join("\n\n"), max_chars)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[async_trait]
impl KnowledgeLookup for WikipediaLookup {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    async fn lookup(&self, query: &str) -> Result<String, ToolError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidArguments("empty lookup query".into()));
        }

        let limit = self.max_pages.to_string();
        let search: SearchResponse = self
            .get(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", &limit),
                ("format", "json"),
            ])
            .await?;

        let titles: Vec<String> = search
            .query
            .map(|q| q.search.into_iter().map(|h| h.title).collect())
            .unwrap_or_default();

        debug!(query, pages = titles.len(), "Wikipedia search");
        if titles.is_empty() {
            return Ok(NO_RESULT.to_string());
        }

        let joined = titles.join("|");
        let extracts: ExtractResponse = self
            .get(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("titles", &joined),
                ("format", "json"),
            ])
            .await?;

        let pages = extracts.query.map(|q| q.pages).unwrap_or_default();
        Ok(format_pages(&titles, &pages, self.max_chars))
    }
}
