//! # Citewright Core
//!
//! Domain types, traits, and error definitions for the Citewright article
//! pipeline. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (LLM provider, web search, encyclopedic
//! lookup, vector store, embedder) is a trait here. Implementations live in
//! their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with scripted doubles
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod event;
pub mod fact;
pub mod memory;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use event::{EventBus, PipelineEvent, Stage};
pub use fact::{Confidence, Fact, Reference, ValidatedFact, Verdict};
pub use memory::{Embedder, FactPayload, FactStore, MemoryRecord, ScoredFact};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use tool::{KnowledgeLookup, WebSearch};
