//! Fact memory traits — a content-addressed, similarity-searchable store.
//!
//! Validated facts are embedded and upserted under an id derived from the
//! fact text, so storing the same text twice overwrites instead of
//! duplicating. Later runs retrieve them by similarity to the topic.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::error::MemoryError;
use crate::fact::Verdict;

/// Payload stored next to each vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactPayload {
    /// The fact text
    pub fact: String,

    /// Citation URL (may be empty)
    #[serde(default)]
    pub source: String,

    /// Verdict the fact was stored under, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
}

/// A single stored point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Stable, content-derived id (see [`MemoryRecord::id_for`])
    pub id: String,

    /// Embedding vector
    pub vector: Vec<f32>,

    pub payload: FactPayload,
}

impl MemoryRecord {
    pub fn new(vector: Vec<f32>, payload: FactPayload) -> Self {
        Self {
            id: Self::id_for(&payload.fact),
            vector,
            payload,
        }
    }

    /// UUID v5 (DNS namespace) of the fact text.
    pub fn id_for(fact_text: &str) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_DNS, fact_text.as_bytes()).to_string()
    }
}

/// A query hit, best first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredFact {
    pub payload: FactPayload,

    /// Cosine similarity to the query vector
    pub score: f32,
}

/// The vector store seam.
///
/// Implementations: in-memory, JSONL file, Qdrant.
#[async_trait]
pub trait FactStore: Send + Sync {
    /// The backend name (e.g., "file", "qdrant").
    fn name(&self) -> &str;

    /// Create the collection if it does not exist yet. Idempotent.
    async fn ensure_collection(&self, dimension: usize) -> std::result::Result<(), MemoryError>;

    /// Insert or overwrite a record by id.
    async fn upsert(&self, record: MemoryRecord) -> std::result::Result<(), MemoryError>;

    /// Return up to `top_k` records ranked by cosine similarity.
    async fn query(&self, vector: &[f32], top_k: usize) -> std::result::Result<Vec<ScoredFact>, MemoryError>;

    /// Drop every record and recreate the empty collection.
    async fn reset(&self) -> std::result::Result<(), MemoryError>;

    /// Number of stored records.
    async fn count(&self) -> std::result::Result<usize, MemoryError>;
}

/// Turns text into fixed-dimension vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    /// Length of every vector this embedder returns.
    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, MemoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_content_derived() {
        let a = MemoryRecord::id_for("Water boils at 100 °C at sea level.");
        let b = MemoryRecord::id_for("Water boils at 100 °C at sea level.");
        let c = MemoryRecord::id_for("Water boils at 90 °C at sea level.");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 36);
    }

    #[test]
    fn record_id_matches_payload_text() {
        let payload = FactPayload {
            fact: "Rust 1.0 shipped in 2015.".into(),
            source: "https://blog.rust-lang.org/".into(),
            verdict: Some(Verdict::True),
        };
        let record = MemoryRecord::new(vec![0.1, 0.2], payload);
        assert_eq!(record.id, MemoryRecord::id_for("Rust 1.0 shipped in 2015."));
    }

    #[test]
    fn payload_tolerates_missing_fields() {
        let payload: FactPayload = serde_json::from_str(r#"{"fact":"x"}"#).unwrap();
        assert_eq!(payload.source, "");
        assert!(payload.verdict.is_none());
    }
}
