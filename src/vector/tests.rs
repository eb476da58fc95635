//! Tests for the vector store module

use super::*;
use proptest::prelude::*;

/// Memory store with `collection` already created
async fn create_test_store(dimension: u64) -> MemoryStore {
    let store = MemoryStore::new("records");
    store
        .recreate("records", dimension, Distance::Cosine)
        .await
        .expect("Failed to create collection");
    store
}

/// Normalize a vector to unit length
fn normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        v.to_vec()
    } else {
        v.iter().map(|x| x / norm).collect()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[tokio::test]
async fn test_recreate_starts_empty() {
    let store = create_test_store(3).await;
    assert_eq!(store.count().await.unwrap(), 0);

    store.upsert("a", vec![1.0, 0.0, 0.0], "alpha").await.unwrap();
    assert_eq!(store.count().await.unwrap(), 1);

    store.recreate("records", 3, Distance::Cosine).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_upsert_overwrites_same_id() {
    let store = create_test_store(2).await;

    store.upsert("r1", vec![1.0, 0.0], "first").await.unwrap();
    store.upsert("r1", vec![0.0, 1.0], "second").await.unwrap();

    assert_eq!(store.count().await.unwrap(), 1);
    assert_eq!(store.text_of("r1").await.unwrap().as_deref(), Some("second"));

    let hits = store.query(&[0.0, 1.0], 5).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert!((hits[0].score - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let store = create_test_store(2).await;
    store.upsert("r1", vec![1.0, 0.0], "text").await.unwrap();

    store.delete("r1").await.unwrap();
    store.delete("r1").await.unwrap();
    store.delete("never-existed").await.unwrap();

    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_upsert_rejects_wrong_dimension() {
    let store = create_test_store(3).await;
    let result = store.upsert("r1", vec![1.0, 0.0], "short").await;

    assert!(matches!(
        result,
        Err(VectorError::InvalidDimension {
            expected: 3,
            actual: 2
        })
    ));
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_collection_errors() {
    let store = MemoryStore::new("absent");

    assert!(matches!(
        store.upsert("r1", vec![1.0], "x").await,
        Err(VectorError::WriteFailed { .. })
    ));
    assert!(matches!(
        store.delete("r1").await,
        Err(VectorError::WriteFailed { .. })
    ));
    assert!(matches!(
        store.query(&[1.0], 1).await,
        Err(VectorError::QueryFailed { .. })
    ));
}

#[tokio::test]
async fn test_query_orders_and_truncates() {
    let store = create_test_store(2).await;
    store.upsert("near", normalize(&[1.0, 0.1]), "near").await.unwrap();
    store.upsert("mid", normalize(&[1.0, 1.0]), "mid").await.unwrap();
    store.upsert("far", normalize(&[0.0, 1.0]), "far").await.unwrap();

    let hits = store.query(&[1.0, 0.0], 2).await.unwrap();
    let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["near", "mid"]);
    assert!(hits[0].score >= hits[1].score);
}

#[tokio::test]
async fn test_handles_share_collections() {
    let store = create_test_store(2).await;
    let other = store.for_collection("records");

    store.upsert("r1", vec![1.0, 0.0], "shared").await.unwrap();
    assert_eq!(other.text_of("r1").await.unwrap().as_deref(), Some("shared"));

    let elsewhere = store.for_collection("elsewhere");
    assert!(elsewhere.count().await.is_err());
}

#[test]
fn test_cosine_similarity() {
    assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
}

#[test]
fn test_point_id_is_stable() {
    assert_eq!(point_id("user-42"), point_id("user-42"));
    assert_ne!(point_id("user-42"), point_id("user-43"));
}

#[test]
fn test_filter_keeps_boundary_and_order() {
    let filter = RelevanceFilter::new(0.5);
    let hits = vec![
        StoredHit::new("a", "A", 0.9),
        StoredHit::new("b", "B", 0.5),
        StoredHit::new("c", "C", 0.49),
    ];

    let kept = filter.apply(hits);
    let ids: Vec<_> = kept.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn test_store_config_defaults() {
    let config = VectorStoreConfig::default();
    assert_eq!(config.backend, StoreBackend::Qdrant);
    assert_eq!(config.url(), "http://localhost:6334");
    assert_eq!(config.collection_name, "loveroom");

    let renamed = config.with_collection_name("other");
    assert_eq!(renamed.collection_name, "other");
}

#[test]
fn test_error_classification() {
    let unavailable = VectorError::StoreUnavailable {
        reason: "down".to_string(),
    };
    assert!(unavailable.is_unavailable());
    assert!(matches!(
        unavailable.into_collection_create("c"),
        VectorError::StoreUnavailable { .. }
    ));

    let other = VectorError::WriteFailed {
        reason: "boom".to_string(),
    };
    assert!(!other.is_unavailable());
    assert!(matches!(
        other.into_collection_create("c"),
        VectorError::CollectionCreateFailed { name, .. } if name == "c"
    ));
}

#[tokio::test]
async fn test_qdrant_unreachable_is_store_unavailable() {
    let config = VectorStoreConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        timeout_ms: 500,
        ..VectorStoreConfig::default()
    };
    let store = QdrantStore::new(config);

    let result = store.query(&[1.0, 0.0], 1).await;
    assert!(matches!(result, Err(VectorError::StoreUnavailable { .. })));
}

#[test]
fn test_transport_failures_are_recognized() {
    use qdrant_client::QdrantError;

    let unavailable = QdrantError::ResponseError {
        status: tonic::Status::unavailable("connection refused"),
    };
    assert!(super::qdrant::is_transport_failure(&unavailable));

    let timed_out = QdrantError::ResponseError {
        status: tonic::Status::deadline_exceeded("timeout expired"),
    };
    assert!(super::qdrant::is_transport_failure(&timed_out));

    let reset = QdrantError::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionReset,
        "connection reset by peer",
    ));
    assert!(super::qdrant::is_transport_failure(&reset));

    let rejected = QdrantError::ResponseError {
        status: tonic::Status::invalid_argument("wrong vector size"),
    };
    assert!(!super::qdrant::is_transport_failure(&rejected));

    let missing = QdrantError::ResponseError {
        status: tonic::Status::not_found("collection records not found"),
    };
    assert!(!super::qdrant::is_transport_failure(&missing));
}

#[test]
fn test_classify_maps_lost_connection_to_unavailable() {
    use qdrant_client::QdrantError;

    let write_failed = |e: QdrantError| VectorError::WriteFailed {
        reason: e.to_string(),
    };

    let lost = QdrantError::ResponseError {
        status: tonic::Status::unavailable("connection reset"),
    };
    assert!(super::qdrant::classify(lost, write_failed).is_unavailable());

    let rejected = QdrantError::ResponseError {
        status: tonic::Status::invalid_argument("wrong vector size"),
    };
    assert!(matches!(
        super::qdrant::classify(rejected, write_failed),
        VectorError::WriteFailed { .. }
    ));

    let create_failed = super::qdrant::classify(
        QdrantError::ResponseError {
            status: tonic::Status::already_exists("exists"),
        },
        |e| VectorError::CollectionCreateFailed {
            name: "records".to_string(),
            reason: e.to_string(),
        },
    );
    assert!(matches!(
        create_failed,
        VectorError::CollectionCreateFailed { name, .. } if name == "records"
    ));
}

#[test]
fn test_points_without_text_are_skipped() {
    use qdrant_client::qdrant::{ScoredPoint, Value};

    let point = |fields: &[(&str, &str)], score: f32| ScoredPoint {
        payload: fields
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(v.to_string())))
            .collect(),
        score,
        ..Default::default()
    };

    let complete = point(
        &[(payload_fields::RECORD_ID, "r1"), (payload_fields::TEXT, "kept")],
        0.9,
    );
    let hit = super::qdrant::hit_from_point(complete).unwrap();
    assert_eq!(hit.id, "r1");
    assert_eq!(hit.text, "kept");
    assert!((hit.score - 0.9).abs() < 1e-6);

    let textless = point(&[(payload_fields::RECORD_ID, "r2")], 0.8);
    assert!(super::qdrant::hit_from_point(textless).is_none());

    // An empty text is still a stored record
    let empty = point(&[(payload_fields::TEXT, "")], 0.7);
    assert_eq!(super::qdrant::hit_from_point(empty).unwrap().text, "");
}

// ============================================================================
// Property-Based Tests
// ============================================================================

fn hits_strategy() -> impl Strategy<Value = Vec<StoredHit>> {
    prop::collection::vec(
        ("[a-z]{1,8}", -1.0f32..=1.0f32).prop_map(|(id, score)| StoredHit::new(id.clone(), id, score)),
        0..20,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Raising the cutoff never adds hits, and survivors keep their order
    #[test]
    fn prop_filter_is_monotone(hits in hits_strategy(), low in 0.0f32..=1.0, delta in 0.0f32..=1.0) {
        let high = (low + delta).min(1.0);
        let loose = RelevanceFilter::new(low).apply(hits.clone());
        let strict = RelevanceFilter::new(high).apply(hits.clone());

        prop_assert!(strict.len() <= loose.len());
        prop_assert!(strict.iter().all(|h| h.score >= high));

        let mut remaining = loose.iter();
        for hit in &strict {
            prop_assert!(remaining.any(|h| h == hit));
        }
    }

    /// Query results are sorted by descending score and capped at top_k
    #[test]
    fn prop_query_sorted_and_capped(
        vectors in prop::collection::vec(prop::collection::vec(-1.0f32..1.0, 4), 1..15),
        top_k in 1usize..10,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let store = create_test_store(4).await;
            for (i, v) in vectors.iter().enumerate() {
                store.upsert(&format!("r{}", i), v.clone(), "t").await.unwrap();
            }

            let hits = store.query(&[0.5, -0.5, 0.25, 1.0], top_k).await.unwrap();
            prop_assert!(hits.len() <= top_k);
            prop_assert_eq!(hits.len(), top_k.min(vectors.len()));
            for pair in hits.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
            }
            Ok(())
        })?;
    }
}
