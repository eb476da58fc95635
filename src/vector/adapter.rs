//! Store-agnostic contract the embedding pool writes through

use async_trait::async_trait;
use uuid::Uuid;

use super::config::Distance;
use super::error::VectorError;

/// Result type for vector operations
pub type VectorResult<T> = Result<T, VectorError>;

/// One candidate returned by a similarity query
#[derive(Debug, Clone, PartialEq)]
pub struct StoredHit {
    /// Caller-assigned record id
    pub id: String,
    /// Record text as it was stored
    pub text: String,
    /// Similarity score (higher is closer)
    pub score: f32,
}

impl StoredHit {
    pub fn new(id: impl Into<String>, text: impl Into<String>, score: f32) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            score,
        }
    }
}

/// Persistence layer over a single remote collection.
///
/// Implementations make exactly one attempt per call and hold any connection
/// only for the duration of that call.
#[async_trait]
pub trait VectorStoreAdapter: Send + Sync {
    /// Insert or overwrite the record `id`
    async fn upsert(&self, id: &str, vector: Vec<f32>, text: &str) -> VectorResult<()>;

    /// Remove the record `id`; absent ids are not an error
    async fn delete(&self, id: &str) -> VectorResult<()>;

    /// Top `top_k` records by descending score
    async fn query(&self, vector: &[f32], top_k: usize) -> VectorResult<Vec<StoredHit>>;

    /// Drop `name` if it exists and create it empty
    async fn recreate(&self, name: &str, dimension: u64, distance: Distance) -> VectorResult<()>;
}

/// Stable point id for a caller-assigned record id.
///
/// Qdrant only accepts integer or UUID point ids, so arbitrary record ids are
/// hashed into a name-based UUID. The same record id always lands on the same
/// point, which is what gives `upsert` its overwrite semantics.
pub fn point_id(record_id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, record_id.as_bytes())
}
