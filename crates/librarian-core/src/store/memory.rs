//! In-memory [`VectorIndex`] implementation for testing and WASM targets.
//!
//! Uses `HashMap`s behind `std::sync::RwLock` for thread safety.
//! Queries are a brute-force distance scan over the collection.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::embedding::Distance;
use crate::models::{Candidate, IndexedDocument, Metadata};

use super::{rank_candidates, VectorIndex};

struct StoredEntry {
    document: String,
    metadata: Metadata,
    embedding: Vec<f32>,
}

struct Collection {
    distance: Distance,
    dims: Option<usize>,
    entries: HashMap<String, StoredEntry>,
}

/// In-memory vector index for testing and WASM environments.
pub struct InMemoryIndex {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Names of all collections, sorted.
    pub fn collection_names(&self) -> Result<Vec<String>> {
        let collections = self.collections.read().map_err(|_| poisoned())?;
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> anyhow::Error {
    anyhow!("in-memory index lock poisoned")
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn get_or_create_collection(&self, name: &str, distance: Distance) -> Result<()> {
        let mut collections = self.collections.write().map_err(|_| poisoned())?;
        collections
            .entry(name.to_string())
            .or_insert_with(|| Collection {
                distance,
                dims: None,
                entries: HashMap::new(),
            });
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().map_err(|_| poisoned())?;
        collections.remove(name);
        Ok(())
    }

    async fn upsert(&self, collection: &str, documents: &[IndexedDocument]) -> Result<()> {
        let mut collections = self.collections.write().map_err(|_| poisoned())?;
        let coll = collections
            .get_mut(collection)
            .ok_or_else(|| anyhow!("collection not found: {}", collection))?;

        let mut dims = coll.dims;
        for doc in documents {
            match dims {
                Some(d) if d != doc.embedding.len() => bail!(
                    "embedding for '{}' has {} dimensions, collection '{}' expects {}",
                    doc.id,
                    doc.embedding.len(),
                    collection,
                    d
                ),
                _ => dims = Some(doc.embedding.len()),
            }
        }

        coll.dims = dims;
        for doc in documents {
            coll.entries.insert(
                doc.id.clone(),
                StoredEntry {
                    document: doc.document.clone(),
                    metadata: doc.metadata.clone(),
                    embedding: doc.embedding.clone(),
                },
            );
        }
        Ok(())
    }

    async fn query(&self, collection: &str, vector: &[f32], k: usize) -> Result<Vec<Candidate>> {
        let collections = self.collections.read().map_err(|_| poisoned())?;
        let coll = match collections.get(collection) {
            Some(c) => c,
            None => return Ok(Vec::new()),
        };

        if let Some(d) = coll.dims {
            if d != vector.len() {
                bail!(
                    "query vector has {} dimensions, collection '{}' expects {}",
                    vector.len(),
                    collection,
                    d
                );
            }
        }

        let mut candidates: Vec<Candidate> = coll
            .entries
            .iter()
            .map(|(id, entry)| Candidate {
                id: id.clone(),
                document: entry.document.clone(),
                metadata: entry.metadata.clone(),
                distance: coll.distance.between(vector, &entry.embedding),
            })
            .collect();
        rank_candidates(&mut candidates, k);
        Ok(candidates)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().map_err(|_| poisoned())?;
        Ok(collections
            .get(collection)
            .map(|c| c.entries.len())
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, embedding: Vec<f32>) -> IndexedDocument {
        let mut metadata = Metadata::new();
        metadata.insert("title".into(), id.into());
        IndexedDocument {
            id: id.to_string(),
            document: format!("Title: {}", id),
            metadata,
            embedding,
        }
    }

    #[tokio::test]
    async fn test_query_orders_by_distance() {
        let index = InMemoryIndex::new();
        index
            .get_or_create_collection("books", Distance::Cosine)
            .await
            .unwrap();
        index
            .upsert(
                "books",
                &[
                    doc("far", vec![0.0, 1.0]),
                    doc("near", vec![1.0, 0.1]),
                    doc("mid", vec![1.0, 1.0]),
                ],
            )
            .await
            .unwrap();

        let results = index.query("books", &[1.0, 0.0], 2).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid"]);
        assert!(results[0].distance <= results[1].distance);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_by_id() {
        let index = InMemoryIndex::new();
        index
            .get_or_create_collection("books", Distance::Cosine)
            .await
            .unwrap();
        let mut second = doc("W1", vec![0.0, 1.0]);
        second.document = "second".into();
        index
            .upsert("books", &[doc("W1", vec![1.0, 0.0]), second])
            .await
            .unwrap();

        assert_eq!(index.count("books").await.unwrap(), 1);
        let results = index.query("books", &[0.0, 1.0], 5).await.unwrap();
        assert_eq!(results[0].document, "second");
    }

    #[tokio::test]
    async fn test_upsert_requires_collection() {
        let index = InMemoryIndex::new();
        let err = index
            .upsert("missing", &[doc("W1", vec![1.0])])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("collection not found"));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let index = InMemoryIndex::new();
        index
            .get_or_create_collection("books", Distance::Cosine)
            .await
            .unwrap();
        index
            .upsert("books", &[doc("a", vec![1.0, 0.0])])
            .await
            .unwrap();
        assert!(index
            .upsert("books", &[doc("b", vec![1.0, 0.0, 0.0])])
            .await
            .is_err());
        assert!(index.query("books", &[1.0], 5).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_collection_is_empty_and_deletable() {
        let index = InMemoryIndex::new();
        assert!(index.query("nope", &[1.0], 5).await.unwrap().is_empty());
        assert_eq!(index.count("nope").await.unwrap(), 0);
        index.delete_collection("nope").await.unwrap();
    }

    #[tokio::test]
    async fn test_get_or_create_keeps_existing_entries() {
        let index = InMemoryIndex::new();
        index
            .get_or_create_collection("books", Distance::Cosine)
            .await
            .unwrap();
        index.upsert("books", &[doc("a", vec![1.0])]).await.unwrap();
        index
            .get_or_create_collection("books", Distance::L2)
            .await
            .unwrap();
        assert_eq!(index.count("books").await.unwrap(), 1);
        assert_eq!(index.collection_names().unwrap(), vec!["books".to_string()]);
    }
}
