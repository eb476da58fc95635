//! In-process vector store
//!
//! Keeps collections in memory behind the same contract as the Qdrant adapter.
//! Used by the `memory` backend for local runs and as the deterministic store
//! in tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::adapter::{StoredHit, VectorResult, VectorStoreAdapter};
use super::config::Distance;
use super::error::VectorError;

/// Internal storage for one record
#[derive(Debug, Clone)]
struct StoredVector {
    vector: Vec<f32>,
    text: String,
}

#[derive(Debug, Default)]
struct MemoryCollection {
    dimension: u64,
    distance: Distance,
    points: HashMap<String, StoredVector>,
}

type Collections = Arc<RwLock<HashMap<String, MemoryCollection>>>;

/// Memory-backed store bound to one collection.
///
/// Handles created with [`MemoryStore::for_collection`] share the same
/// underlying collections, so data survives a pool reload as long as one
/// handle is alive.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    collections: Collections,
    collection: String,
}

impl MemoryStore {
    /// Create an empty store bound to `collection`
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            collection: collection.into(),
        }
    }

    /// Another handle over the same data, bound to `collection`
    pub fn for_collection(&self, collection: impl Into<String>) -> Self {
        Self {
            collections: Arc::clone(&self.collections),
            collection: collection.into(),
        }
    }

    /// Name of the bound collection
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Number of records in the bound collection
    pub async fn count(&self) -> VectorResult<u64> {
        let collections = self.collections.read().await;
        let collection = collections
            .get(&self.collection)
            .ok_or_else(|| VectorError::QueryFailed {
                reason: format!("collection '{}' not found", self.collection),
            })?;
        Ok(collection.points.len() as u64)
    }

    /// Stored text for `id`, if any
    pub async fn text_of(&self, id: &str) -> VectorResult<Option<String>> {
        let collections = self.collections.read().await;
        let collection = collections
            .get(&self.collection)
            .ok_or_else(|| VectorError::QueryFailed {
                reason: format!("collection '{}' not found", self.collection),
            })?;
        Ok(collection.points.get(id).map(|stored| stored.text.clone()))
    }

    fn missing(&self) -> String {
        format!("collection '{}' not found", self.collection)
    }
}

#[async_trait]
impl VectorStoreAdapter for MemoryStore {
    async fn upsert(&self, id: &str, vector: Vec<f32>, text: &str) -> VectorResult<()> {
        let mut collections = self.collections.write().await;
        let collection = collections
            .get_mut(&self.collection)
            .ok_or_else(|| VectorError::WriteFailed {
                reason: self.missing(),
            })?;

        validate_vector_dimension(collection.dimension, &vector)?;

        collection.points.insert(
            id.to_string(),
            StoredVector {
                vector,
                text: text.to_string(),
            },
        );

        debug!("Upserted record '{}' into '{}'", id, self.collection);
        Ok(())
    }

    async fn delete(&self, id: &str) -> VectorResult<()> {
        let mut collections = self.collections.write().await;
        let collection = collections
            .get_mut(&self.collection)
            .ok_or_else(|| VectorError::WriteFailed {
                reason: self.missing(),
            })?;

        if collection.points.remove(id).is_some() {
            debug!("Deleted record '{}' from '{}'", id, self.collection);
        }
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> VectorResult<Vec<StoredHit>> {
        let collections = self.collections.read().await;
        let collection = collections
            .get(&self.collection)
            .ok_or_else(|| VectorError::QueryFailed {
                reason: self.missing(),
            })?;

        validate_vector_dimension(collection.dimension, vector).map_err(|e| {
            VectorError::QueryFailed {
                reason: e.to_string(),
            }
        })?;

        let mut scored: Vec<StoredHit> = collection
            .points
            .iter()
            .map(|(id, stored)| {
                let score = calculate_similarity(collection.distance, vector, &stored.vector);
                StoredHit::new(id.clone(), stored.text.clone(), score)
            })
            .collect();

        // Sort by score descending
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);

        debug!(
            "Query on '{}' returned {} hits (top_k: {})",
            self.collection,
            scored.len(),
            top_k
        );
        Ok(scored)
    }

    async fn recreate(&self, name: &str, dimension: u64, distance: Distance) -> VectorResult<()> {
        let mut collections = self.collections.write().await;
        let previous = collections.insert(
            name.to_string(),
            MemoryCollection {
                dimension,
                distance,
                points: HashMap::new(),
            },
        );

        if let Some(previous) = previous {
            info!(
                "Dropped collection '{}' ({} records) before recreating it",
                name,
                previous.points.len()
            );
        }
        info!("Created collection '{}' with dimension {}", name, dimension);
        Ok(())
    }
}

fn validate_vector_dimension(expected: u64, vector: &[f32]) -> VectorResult<()> {
    let actual = vector.len() as u64;
    if actual != expected {
        return Err(VectorError::InvalidDimension { expected, actual });
    }
    Ok(())
}

fn calculate_similarity(distance: Distance, a: &[f32], b: &[f32]) -> f32 {
    match distance {
        Distance::Cosine => cosine_similarity(a, b),
        Distance::Euclidean => euclidean_similarity(a, b),
        Distance::Dot => dot_product(a, b),
    }
}

/// Returns a value between -1 and 1, where 1 means identical direction
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot = dot_product(a, b);
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// 1 / (1 + L2 distance)
fn euclidean_similarity(a: &[f32], b: &[f32]) -> f32 {
    let distance: f32 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        .sqrt();

    1.0 / (1.0 + distance)
}

fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
