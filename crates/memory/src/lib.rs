//! Fact memory for Citewright.
//!
//! Stores implement `citewright_core::FactStore`; embedders implement
//! `citewright_core::Embedder`. The pipeline only sees [`FactMemory`].

pub mod adapter;
pub mod embedding;
pub mod file_backend;
pub mod in_memory;
pub mod qdrant;
pub mod vector;

pub use adapter::FactMemory;
pub use embedding::{HashEmbedder, ProviderEmbedder};
pub use file_backend::FileFactStore;
pub use in_memory::InMemoryFactStore;
pub use qdrant::QdrantFactStore;
pub use vector::{cosine_similarity, rank_records};
