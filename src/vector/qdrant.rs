//! Qdrant-backed vector store
//!
//! Every operation opens its own client, checks the server is reachable and
//! drops the client when the call returns, whatever the outcome. A connection
//! lost after the health check still surfaces as `StoreUnavailable`.

use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    value::Kind, CreateCollectionBuilder, DeletePointsBuilder, PointStruct, PointsIdsList,
    QueryPointsBuilder, ScoredPoint, UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant, QdrantError};
use tonic::Code;
use tracing::{debug, info, warn};

use super::adapter::{point_id, StoredHit, VectorResult, VectorStoreAdapter};
use super::config::{Distance, VectorStoreConfig};
use super::error::VectorError;
use super::payload_fields;

/// Vector store over a remote Qdrant collection
#[derive(Debug, Clone)]
pub struct QdrantStore {
    config: VectorStoreConfig,
}

impl QdrantStore {
    pub fn new(config: VectorStoreConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &VectorStoreConfig {
        &self.config
    }

    /// Open a scoped client and make sure the server answers
    async fn open(&self) -> VectorResult<Qdrant> {
        let url = self.config.url();
        let timeout = Duration::from_millis(self.config.timeout_ms);

        let client = Qdrant::from_url(&url)
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| VectorError::StoreUnavailable {
                reason: format!("failed to create client for {}: {}", url, e),
            })?;

        client
            .health_check()
            .await
            .map_err(|e| VectorError::StoreUnavailable {
                reason: format!("{} did not answer: {}", url, e),
            })?;

        Ok(client)
    }
}

#[async_trait]
impl VectorStoreAdapter for QdrantStore {
    async fn upsert(&self, id: &str, vector: Vec<f32>, text: &str) -> VectorResult<()> {
        let client = self.open().await?;

        let mut payload = Payload::new();
        payload.insert(payload_fields::RECORD_ID, id.to_string());
        payload.insert(payload_fields::TEXT, text.to_string());

        let point = PointStruct::new(point_id(id).to_string(), vector, payload);

        client
            .upsert_points(
                UpsertPointsBuilder::new(&self.config.collection_name, vec![point]).wait(true),
            )
            .await
            .map_err(|e| {
                classify(e, |e| VectorError::WriteFailed {
                    reason: format!("upsert of '{}' failed: {}", id, e),
                })
            })?;

        debug!(
            "Upserted record '{}' into '{}'",
            id, self.config.collection_name
        );
        Ok(())
    }

    async fn delete(&self, id: &str) -> VectorResult<()> {
        let client = self.open().await?;

        // Qdrant treats unknown point ids as a no-op
        client
            .delete_points(
                DeletePointsBuilder::new(&self.config.collection_name)
                    .points(PointsIdsList {
                        ids: vec![point_id(id).to_string().into()],
                    })
                    .wait(true),
            )
            .await
            .map_err(|e| {
                classify(e, |e| VectorError::WriteFailed {
                    reason: format!("delete of '{}' failed: {}", id, e),
                })
            })?;

        debug!(
            "Deleted record '{}' from '{}'",
            id, self.config.collection_name
        );
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> VectorResult<Vec<StoredHit>> {
        let client = self.open().await?;

        let response = client
            .query(
                QueryPointsBuilder::new(&self.config.collection_name)
                    .query(vector.to_vec())
                    .limit(top_k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(|e| {
                classify(e, |e| VectorError::QueryFailed {
                    reason: e.to_string(),
                })
            })?;

        let hits: Vec<StoredHit> = response
            .result
            .into_iter()
            .filter_map(hit_from_point)
            .collect();

        debug!(
            "Query on '{}' returned {} hits (top_k: {})",
            self.config.collection_name,
            hits.len(),
            top_k
        );
        Ok(hits)
    }

    async fn recreate(&self, name: &str, dimension: u64, distance: Distance) -> VectorResult<()> {
        let client = self.open().await?;

        let exists = client.collection_exists(name).await.map_err(|e| {
            classify(e, |e| VectorError::CollectionCreateFailed {
                name: name.to_string(),
                reason: e.to_string(),
            })
        })?;

        if exists {
            client
                .delete_collection(name)
                .await
                .map_err(|e| {
                    classify(e, |e| VectorError::CollectionCreateFailed {
                        name: name.to_string(),
                        reason: format!("could not drop existing collection: {}", e),
                    })
                })?;
            info!("Dropped existing collection '{}'", name);
        }

        client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(VectorParamsBuilder::new(dimension, distance.into())),
            )
            .await
            .map_err(|e| {
                classify(e, |e| VectorError::CollectionCreateFailed {
                    name: name.to_string(),
                    reason: e.to_string(),
                })
            })?;

        info!(
            "Created collection '{}' with dimension {} ({:?})",
            name, dimension, distance
        );
        Ok(())
    }
}

/// Whether the call failed because the server could not be reached
pub(super) fn is_transport_failure(err: &QdrantError) -> bool {
    match err {
        QdrantError::ResponseError { status } => matches!(
            status.code(),
            Code::Unavailable | Code::DeadlineExceeded | Code::Cancelled
        ),
        QdrantError::Io(_) => true,
        _ => false,
    }
}

/// `StoreUnavailable` for transport failures, `otherwise` for the rest
pub(super) fn classify(
    err: QdrantError,
    otherwise: impl FnOnce(QdrantError) -> VectorError,
) -> VectorError {
    if is_transport_failure(&err) {
        VectorError::StoreUnavailable {
            reason: err.to_string(),
        }
    } else {
        otherwise(err)
    }
}

/// Points without a text payload are skipped
pub(super) fn hit_from_point(point: ScoredPoint) -> Option<StoredHit> {
    let field = |key: &str| -> Option<String> {
        match point.payload.get(key).and_then(|v| v.kind.as_ref()) {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        }
    };

    let id = field(payload_fields::RECORD_ID).unwrap_or_default();
    let Some(text) = field(payload_fields::TEXT) else {
        warn!(record_id = %id, score = point.score, "Skipping point without text payload");
        return None;
    };

    Some(StoredHit::new(id, text, point.score))
}
