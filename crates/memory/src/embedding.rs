//! Embedders that turn fact text into vectors.
//!
//! - [`HashEmbedder`]: offline feature hashing over word unigrams and
//!   bigrams. Texts sharing vocabulary land close together, which is all
//!   topic-similarity retrieval needs.
//! - [`ProviderEmbedder`]: delegates to an OpenAI-compatible `/embeddings`
//!   endpoint through the core `Provider` trait.

use async_trait::async_trait;
use citewright_core::error::MemoryError;
use citewright_core::memory::Embedder;
use citewright_core::provider::{EmbeddingRequest, Provider};
use sha2::{Digest, Sha256};
use std::sync::Arc;

pub const DEFAULT_DIMENSION: usize = 384;

/// Deterministic, dependency-free embedder.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    /// Embed synchronously. Empty or punctuation-only text yields a zero vector.
    pub fn vector(&self, text: &str) -> Vec<f32> {
        let tokens = normalize_tokens(text);
        let mut v = vec![0.0f32; self.dimension];

        let unigrams = tokens.iter().map(|t| t.to_string());
        let bigrams = tokens.windows(2).map(|w| format!("{} {}", w[0], w[1]));

        for feature in unigrams.chain(bigrams) {
            let digest = Sha256::digest(feature.as_bytes());
            let mut idx = [0u8; 8];
            idx.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(idx) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }

        l2_normalize(&mut v);
        v
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

/// Lowercased alphanumeric words.
fn normalize_tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn name(&self) -> &str {
        "hash"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        Ok(self.vector(text))
    }
}

/// Embeddings from a remote model.
pub struct ProviderEmbedder {
    provider: Arc<dyn Provider>,
    model: String,
    dimension: usize,
}

impl ProviderEmbedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            provider,
            model: model.into(),
            dimension,
        }
    }
}

#[async_trait]
impl Embedder for ProviderEmbedder {
    fn name(&self) -> &str {
        "provider"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.model.clone(),
                inputs: vec![text.to_string()],
            })
            .await
            .map_err(|e| MemoryError::EmbeddingFailed(e.to_string()))?;

        let vector = response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| MemoryError::EmbeddingFailed("empty embedding response".into()))?;

        if vector.len() != self.dimension {
            return Err(MemoryError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }
}
