//! In-memory fact store — useful for testing and ephemeral runs.

use async_trait::async_trait;
use citewright_core::error::MemoryError;
use citewright_core::memory::{FactStore, MemoryRecord, ScoredFact};
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::vector::{rank_records, upsert_by_id};

#[derive(Default)]
struct Collection {
    /// Set by `ensure_collection`; vectors of any other length are refused.
    dimension: Option<usize>,
    records: Vec<MemoryRecord>,
}

impl Collection {
    fn check_dimension(&self, actual: usize) -> Result<(), MemoryError> {
        match self.dimension {
            Some(expected) if expected != actual => {
                Err(MemoryError::DimensionMismatch { expected, actual })
            }
            _ => Ok(()),
        }
    }
}

/// An in-memory store that keeps records in a Vec and ranks by cosine.
pub struct InMemoryFactStore {
    inner: Arc<RwLock<Collection>>,
}

impl InMemoryFactStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Collection::default())),
        }
    }
}

impl Default for InMemoryFactStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FactStore for InMemoryFactStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn ensure_collection(&self, dimension: usize) -> Result<(), MemoryError> {
        let mut inner = self.inner.write().await;
        if inner.dimension.is_none() {
            inner.dimension = Some(dimension);
        }
        inner.check_dimension(dimension)
    }

    async fn upsert(&self, record: MemoryRecord) -> Result<(), MemoryError> {
        let mut inner = self.inner.write().await;
        inner.check_dimension(record.vector.len())?;
        upsert_by_id(&mut inner.records, record);
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredFact>, MemoryError> {
        let inner = self.inner.read().await;
        inner.check_dimension(vector.len())?;
        Ok(rank_records(&inner.records, vector, top_k))
    }

    async fn reset(&self) -> Result<(), MemoryError> {
        self.inner.write().await.records.clear();
        Ok(())
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.inner.read().await.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citewright_core::memory::FactPayload;

    fn record(text: &str, vector: Vec<f32>) -> MemoryRecord {
        MemoryRecord::new(
            vector,
            FactPayload {
                fact: text.into(),
                source: "https://example.org".into(),
                verdict: None,
            },
        )
    }

    #[tokio::test]
    async fn upsert_and_query() {
        let store = InMemoryFactStore::new();
        store.ensure_collection(2).await.unwrap();
        store.upsert(record("north", vec![1.0, 0.0])).await.unwrap();
        store.upsert(record("east", vec![0.0, 1.0])).await.unwrap();

        let hits = store.query(&[0.9, 0.1], 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].payload.fact, "north");
    }

    #[tokio::test]
    async fn same_text_overwrites() {
        let store = InMemoryFactStore::new();
        store.upsert(record("dup", vec![1.0, 0.0])).await.unwrap();
        store.upsert(record("dup", vec![0.0, 1.0])).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn dimension_enforced_after_ensure() {
        let store = InMemoryFactStore::new();
        store.ensure_collection(3).await.unwrap();
        let err = store.upsert(record("short", vec![1.0, 0.0])).await.unwrap_err();
        assert!(matches!(err, MemoryError::DimensionMismatch { expected: 3, actual: 2 }));
        assert!(store.ensure_collection(4).await.is_err());
    }

    #[tokio::test]
    async fn reset_clears() {
        let store = InMemoryFactStore::new();
        store.upsert(record("gone", vec![1.0])).await.unwrap();
        store.reset().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.query(&[1.0], 5).await.unwrap().is_empty());
    }
}
