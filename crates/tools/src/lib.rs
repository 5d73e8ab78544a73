//! External knowledge sources for Citewright.
//!
//! - [`TavilySearch`] implements `WebSearch` for the research stage.
//! - [`WikipediaLookup`] implements `KnowledgeLookup` for validation.

pub mod tavily;
pub mod wikipedia;

pub use tavily::TavilySearch;
pub use wikipedia::WikipediaLookup;
