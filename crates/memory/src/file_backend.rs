//! File-based fact store — persistent JSON-lines storage.
//!
//! Each line is a JSON-encoded `MemoryRecord`. Records are loaded into
//! memory on open and the whole file is rewritten after every mutation.
//!
//! Default location: `~/.citewright/memory/facts.jsonl`

use async_trait::async_trait;
use citewright_core::error::MemoryError;
use citewright_core::memory::{FactStore, MemoryRecord, ScoredFact};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use crate::vector::{rank_records, upsert_by_id};

/// A file-backed fact store using JSONL (one record per line).
pub struct FileFactStore {
    path: PathBuf,
    records: Arc<RwLock<Vec<MemoryRecord>>>,
    dimension: RwLock<Option<usize>>,
}

impl FileFactStore {
    /// Open the store at `path`.
    ///
    /// A missing file starts empty; it is created on the first write.
    pub fn open(path: PathBuf) -> Self {
        let records = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = records.len(), "File fact store loaded");
        Self {
            path,
            records: Arc::new(RwLock::new(records)),
            dimension: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_disk(path: &Path) -> Vec<MemoryRecord> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Vec::new(),
        };

        let mut records = Vec::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<MemoryRecord>(line) {
                Ok(record) => upsert_by_id(&mut records, record),
                Err(e) => warn!(error = %e, "Skipping corrupted fact record"),
            }
        }
        records
    }

    /// Flush all records to disk as JSONL.
    async fn flush(&self) -> Result<(), MemoryError> {
        let records = self.records.read().await;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MemoryError::Storage(format!("Failed to create memory directory: {e}"))
            })?;
        }

        let mut content = String::new();
        for record in records.iter() {
            let line = serde_json::to_string(record).map_err(|e| {
                MemoryError::Storage(format!("Failed to serialize fact record: {e}"))
            })?;
            content.push_str(&line);
            content.push('\n');
        }

        std::fs::write(&self.path, &content)
            .map_err(|e| MemoryError::Storage(format!("Failed to write memory file: {e}")))?;

        Ok(())
    }

    async fn check_dimension(&self, actual: usize) -> Result<(), MemoryError> {
        match *self.dimension.read().await {
            Some(expected) if expected != actual => {
                Err(MemoryError::DimensionMismatch { expected, actual })
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl FactStore for FileFactStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn ensure_collection(&self, dimension: usize) -> Result<(), MemoryError> {
        let stale = self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.vector.len() != dimension)
            .count();
        if stale > 0 {
            warn!(
                stale,
                dimension,
                path = %self.path.display(),
                "Stored vectors do not match the configured dimension; they will never rank"
            );
        }
        *self.dimension.write().await = Some(dimension);
        Ok(())
    }

    async fn upsert(&self, record: MemoryRecord) -> Result<(), MemoryError> {
        self.check_dimension(record.vector.len()).await?;
        upsert_by_id(&mut *self.records.write().await, record);
        self.flush().await
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredFact>, MemoryError> {
        self.check_dimension(vector.len()).await?;
        let records = self.records.read().await;
        Ok(rank_records(&records, vector, top_k))
    }

    async fn reset(&self) -> Result<(), MemoryError> {
        self.records.write().await.clear();
        self.flush().await
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.records.read().await.len())
    }
}
