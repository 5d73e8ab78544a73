//! `FactMemory` — the store/retrieve capability the pipeline consumes.
//!
//! Failures of the embedder or the store are logged and swallowed: a read
//! returns no facts, a write does nothing. A fact-checking run must never
//! die because the memory store is down.

use citewright_core::error::MemoryError;
use citewright_core::fact::ValidatedFact;
use citewright_core::memory::{Embedder, FactPayload, FactStore, MemoryRecord, ScoredFact};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

pub const DEFAULT_TOP_K: usize = 5;

pub struct FactMemory {
    store: Arc<dyn FactStore>,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
    ready: OnceCell<()>,
}

impl FactMemory {
    pub fn new(store: Arc<dyn FactStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store,
            embedder,
            top_k: DEFAULT_TOP_K,
            ready: OnceCell::new(),
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Create the collection once per process.
    async fn ensure_ready(&self) -> Result<(), MemoryError> {
        self.ready
            .get_or_try_init(|| async {
                self.store.ensure_collection(self.embedder.dimension()).await
            })
            .await
            .map(|_| ())
    }

    async fn try_store(&self, payload: FactPayload) -> Result<(), MemoryError> {
        self.ensure_ready().await?;
        let vector = self.embedder.embed(&payload.fact).await?;
        self.store.upsert(MemoryRecord::new(vector, payload)).await
    }

    async fn try_retrieve(&self, query: &str, top_k: usize) -> Result<Vec<ScoredFact>, MemoryError> {
        self.ensure_ready().await?;
        let vector = self.embedder.embed(query).await?;
        self.store.query(&vector, top_k).await
    }

    async fn store_payload(&self, payload: FactPayload) -> bool {
        if payload.fact.trim().is_empty() {
            return false;
        }
        match self.try_store(payload).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, store = self.store.name(), "Failed to store fact, skipping");
                false
            }
        }
    }

    /// Embed and upsert one fact. Returns whether the write landed.
    pub async fn store_fact(&self, fact: &str, source: &str) -> bool {
        self.store_payload(FactPayload {
            fact: fact.to_string(),
            source: source.to_string(),
            verdict: None,
        })
        .await
    }

    /// Persist a validated fact together with its verdict.
    pub async fn store_validated(&self, fact: &ValidatedFact) -> bool {
        self.store_payload(FactPayload {
            fact: fact.fact.clone(),
            source: fact.source.clone(),
            verdict: Some(fact.verdict),
        })
        .await
    }

    /// Stored facts most similar to `query`, best first; empty on failure.
    pub async fn retrieve_facts(&self, query: &str) -> Vec<FactPayload> {
        self.search(query, self.top_k)
            .await
            .into_iter()
            .map(|hit| hit.payload)
            .collect()
    }

    /// Scored hits for `query`; empty on failure.
    pub async fn search(&self, query: &str, top_k: usize) -> Vec<ScoredFact> {
        match self.try_retrieve(query, top_k).await {
            Ok(hits) => {
                debug!(query, hits = hits.len(), "Memory lookup");
                hits
            }
            Err(e) => {
                warn!(error = %e, store = self.store.name(), "Memory lookup failed, continuing without memory");
                Vec::new()
            }
        }
    }

    /// Drop every stored fact. Unlike reads and writes this reports failure.
    pub async fn reset(&self) -> Result<(), MemoryError> {
        self.store.reset().await
    }

    pub async fn count(&self) -> Result<usize, MemoryError> {
        self.store.count().await
    }
}
