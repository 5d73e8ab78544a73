//! Tool traits — the external knowledge sources the stages consult.
//!
//! Research calls a [`WebSearch`] once per run; validation calls a
//! [`KnowledgeLookup`] for an encyclopedic excerpt. Both return plain text
//! that is pasted into a prompt, so implementations own the formatting.

use async_trait::async_trait;
use crate::error::ToolError;

/// Ranked web search rendered as a text blob.
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// The unique name of this tool (e.g., "tavily_search").
    fn name(&self) -> &str;

    async fn search(&self, query: &str) -> std::result::Result<String, ToolError>;
}

/// Encyclopedic summary for a topic.
#[async_trait]
pub trait KnowledgeLookup: Send + Sync {
    /// The unique name of this tool (e.g., "wikipedia").
    fn name(&self) -> &str;

    async fn lookup(&self, query: &str) -> std::result::Result<String, ToolError>;
}
