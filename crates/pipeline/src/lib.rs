//! The Citewright article pipeline.
//!
//! Four model-backed stages with line-parsed text contracts between them:
//!
//! 1. [`research`] — web search, then cited bullet facts
//! 2. [`validation`] — memory and encyclopedia backed True/False/Uncertain verdicts
//! 3. [`writer`] — article from every fact not rated Low
//! 4. [`citation`] — numbered inline citations and a rebuilt references list
//!
//! [`Pipeline`] runs them in order and writes validated facts back to
//! memory between validation and writing.

pub mod citation;
pub mod model;
pub mod orchestrator;
pub mod parse;
pub mod prompts;
pub mod references;
pub mod research;
pub mod validation;
pub mod writer;

#[cfg(test)]
mod test_helpers;

pub use citation::{CitationOutput, CitationPolicy};
pub use model::{StageModel, StageModels};
pub use orchestrator::{Pipeline, PipelineContext, PipelineRun};
pub use parse::{LineOutcome, ParseFailure, ParseReport};
pub use research::ResearchOutput;
pub use validation::ValidationOutput;
pub use writer::WriterOutput;
