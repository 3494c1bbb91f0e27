//! Vector index abstraction for Smart Librarian.
//!
//! The [`VectorIndex`] trait is the narrow capability the ingestion and
//! retrieval pipelines consume, enabling pluggable backends (SQLite,
//! in-memory, hosted vector databases).
//!
//! Implementations must be `Send + Sync` to work with async runtimes and
//! must tolerate concurrent upserts.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::embedding::Distance;
use crate::models::{Candidate, IndexedDocument};

/// Abstract vector index holding named collections of documents.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get_or_create_collection`](VectorIndex::get_or_create_collection) | Create a collection or reuse an existing one |
/// | [`delete_collection`](VectorIndex::delete_collection) | Drop a collection; `Ok` if it does not exist |
/// | [`upsert`](VectorIndex::upsert) | Insert or overwrite documents by id |
/// | [`query`](VectorIndex::query) | k nearest neighbours, ascending distance |
/// | [`count`](VectorIndex::count) | Number of documents in a collection |
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create the collection with the given metric, or reuse it as-is.
    async fn get_or_create_collection(&self, name: &str, distance: Distance) -> Result<()>;

    /// Delete the collection and everything in it.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Insert or overwrite documents. Later entries with the same id win.
    ///
    /// Fails if the collection does not exist or a vector's length differs
    /// from the collection's dimensionality.
    async fn upsert(&self, collection: &str, documents: &[IndexedDocument]) -> Result<()>;

    /// Return at most `k` candidates sorted by non-decreasing distance.
    ///
    /// A missing collection yields no candidates.
    async fn query(&self, collection: &str, vector: &[f32], k: usize) -> Result<Vec<Candidate>>;

    /// Number of documents in the collection (`0` if it does not exist).
    async fn count(&self, collection: &str) -> Result<usize>;
}

/// Sort candidates by distance (then id, for stable ties) and keep the top `k`.
///
/// NaN distances rank last, whatever their sign bit.
pub fn rank_candidates(candidates: &mut Vec<Candidate>, k: usize) {
    candidates.sort_by(|a, b| {
        sort_key(a.distance)
            .total_cmp(&sort_key(b.distance))
            .then_with(|| a.id.cmp(&b.id))
    });
    candidates.truncate(k);
}

fn sort_key(distance: f32) -> f32 {
    if distance.is_nan() {
        f32::INFINITY
    } else {
        distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metadata;

    fn candidate(id: &str, distance: f32) -> Candidate {
        Candidate {
            id: id.to_string(),
            document: String::new(),
            metadata: Metadata::new(),
            distance,
        }
    }

    #[test]
    fn test_rank_candidates_sorts_and_truncates() {
        let mut c = vec![
            candidate("c", 0.5),
            candidate("a", 0.1),
            candidate("b", 0.5),
            candidate("d", 0.9),
        ];
        rank_candidates(&mut c, 3);
        let ids: Vec<&str> = c.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_rank_candidates_nan_distances_sort_last() {
        let mut c: Vec<Candidate> = (0..64)
            .map(|i| {
                let distance = match i % 3 {
                    0 => f32::NAN,
                    1 => -f32::NAN,
                    _ => i as f32 / 100.0,
                };
                candidate(&format!("c{:02}", i), distance)
            })
            .collect();
        rank_candidates(&mut c, 5);
        let ids: Vec<&str> = c.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c02", "c05", "c08", "c11", "c14"]);

        let mut all_nan = vec![candidate("b", f32::NAN), candidate("a", -f32::NAN)];
        rank_candidates(&mut all_nan, 5);
        assert_eq!(all_nan[0].id, "a");
        assert_eq!(all_nan.len(), 2);
    }

    #[test]
    fn test_rank_candidates_zero_k() {
        let mut c = vec![candidate("a", 0.1)];
        rank_candidates(&mut c, 0);
        assert!(c.is_empty());
    }
}
