//! Vector similarity utilities.
//!
//! Pure-Rust cosine similarity and top-k ranking used by the in-process
//! stores. The Qdrant store ranks server-side.

use citewright_core::memory::{MemoryRecord, ScoredFact};

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length or empty.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Rank records by cosine similarity to a query vector, best first.
pub fn rank_records(records: &[MemoryRecord], query: &[f32], top_k: usize) -> Vec<ScoredFact> {
    let mut scored: Vec<ScoredFact> = records
        .iter()
        .map(|r| ScoredFact {
            payload: r.payload.clone(),
            score: cosine_similarity(&r.vector, query),
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);
    scored
}

/// Insert `record`, replacing any record with the same id in place.
pub(crate) fn upsert_by_id(records: &mut Vec<MemoryRecord>, record: MemoryRecord) {
    match records.iter_mut().find(|r| r.id == record.id) {
        Some(existing) => *existing = record,
        None => records.push(record),
    }
}
