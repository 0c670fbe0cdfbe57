//! HTTP boundary tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use paddock_core::{PaddockResult, RoundsResponse, SeasonsResponse, WriteOutcome};
use paddock_scheduler::{
    create_router, GetRoundResponse, ScheduleService, WriteRoundsRequest, WriteSeasonsRequest,
};
use paddock_storage::{
    CacheBackend, CacheConfig, CacheStats, Document, DocumentStore, Filter, InMemoryCacheBackend,
    InMemoryDocumentStore, Upsert,
};
use paddock_test_utils::fixtures::{bahrain_round, season_fixture};
use serde_json::{json, Value};
use tower::ServiceExt;

// ============================================================================
// TEST SUPPORT
// ============================================================================

fn test_app() -> (Router, Arc<InMemoryDocumentStore>) {
    let store = Arc::new(InMemoryDocumentStore::new());
    let service = Arc::new(ScheduleService::new(
        Arc::clone(&store),
        Arc::new(InMemoryCacheBackend::new()),
        CacheConfig::default(),
    ));
    (create_router(service, Duration::from_secs(5)), store)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router should not fail");
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

async fn post(app: &Router, method: &str, body: String) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(format!("/rpc/{}", method))
        .header("content-type", "application/json")
        .body(Body::from(body))
        .expect("request should build");
    send(app, request).await
}

async fn post_json(app: &Router, method: &str, body: Value) -> (StatusCode, Value) {
    post(app, method, body.to_string()).await
}

// ============================================================================
// READS
// ============================================================================

#[tokio::test]
async fn test_write_then_get_rounds() {
    let (app, _store) = test_app();

    let request = WriteRoundsRequest {
        rounds: vec![bahrain_round()],
    };
    let (status, body) = post(&app, "WriteRounds", serde_json::to_string(&request).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let outcome: WriteOutcome = serde_json::from_value(body).unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.records_affected, 1);

    let (status, body) = post_json(&app, "GetRounds", json!({ "season": 2024 })).await;
    assert_eq!(status, StatusCode::OK);
    let response: RoundsResponse = serde_json::from_value(body).unwrap();
    assert_eq!(response.rounds, vec![bahrain_round()]);
    assert!(!response.metadata.cached);

    let (_, body) = post_json(&app, "GetRounds", json!({ "season": 2024 })).await;
    let response: RoundsResponse = serde_json::from_value(body).unwrap();
    assert!(response.metadata.cached);
}

#[tokio::test]
async fn test_get_seasons_empty_filter() {
    let (app, _store) = test_app();
    let request = WriteSeasonsRequest {
        seasons: vec![season_fixture(2023), season_fixture(2024)],
    };
    let (status, _) = post(&app, "WriteSeasons", serde_json::to_string(&request).unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_json(&app, "GetSeasons", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let response: SeasonsResponse = serde_json::from_value(body).unwrap();
    assert_eq!(response.seasons.len(), 2);
}

#[tokio::test]
async fn test_get_seasons_status_filter() {
    let (app, _store) = test_app();
    let request = WriteSeasonsRequest {
        seasons: vec![season_fixture(2023)],
    };
    post(&app, "WriteSeasons", serde_json::to_string(&request).unwrap()).await;

    let (status, body) =
        post_json(&app, "GetSeasons", json!({ "year": 2023, "status": "completed" })).await;
    assert_eq!(status, StatusCode::OK);
    let response: SeasonsResponse = serde_json::from_value(body).unwrap();
    assert_eq!(response.seasons, vec![season_fixture(2023)]);
}

#[tokio::test]
async fn test_get_round_found_and_missing() {
    let (app, _store) = test_app();
    let request = WriteRoundsRequest {
        rounds: vec![bahrain_round()],
    };
    post(&app, "WriteRounds", serde_json::to_string(&request).unwrap()).await;

    let (status, body) = post_json(&app, "GetRound", json!({ "season": 2024, "round_id": 1 })).await;
    assert_eq!(status, StatusCode::OK);
    let response: GetRoundResponse = serde_json::from_value(body).unwrap();
    assert_eq!(response.round, bahrain_round());

    let (status, body) = post_json(&app, "GetRound", json!({ "season": 2024, "round_id": 7 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ENTITY_NOT_FOUND");
}

// ============================================================================
// ERRORS
// ============================================================================

#[tokio::test]
async fn test_non_numeric_season_is_invalid_input() {
    let (app, store) = test_app();

    let (status, body) = post_json(&app, "GetRounds", json!({ "season": "twenty" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
    assert_eq!(store.find_calls(), 0, "rejected input must not reach the store");
}

#[tokio::test]
async fn test_malformed_body_is_invalid_input() {
    let (app, _store) = test_app();
    let (status, body) = post(&app, "GetSeasons", "{not json".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_store_failure_is_internal_error() {
    let (app, store) = test_app();
    store.fail_next_find();

    let (status, body) = post_json(&app, "GetSeasons", json!({ "year": 2024 })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "INTERNAL_ERROR");
}

#[tokio::test]
async fn test_write_failure_is_a_result_not_an_error() {
    let (app, store) = test_app();
    store.set_fail_writes(true);

    let request = WriteRoundsRequest {
        rounds: vec![bahrain_round()],
    };
    let (status, body) = post(&app, "WriteRounds", serde_json::to_string(&request).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["records_affected"], 0);
}

#[tokio::test]
async fn test_unknown_method_is_not_found() {
    let (app, _store) = test_app();
    let (status, _) = post_json(&app, "DeleteSeasons", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Store whose reads never finish inside any reasonable deadline.
struct StalledStore;

#[async_trait]
impl DocumentStore for StalledStore {
    async fn find(&self, _collection: &str, _filter: &Filter) -> PaddockResult<Vec<Document>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Vec::new())
    }

    async fn bulk_upsert(&self, _collection: &str, batch: Vec<Upsert>) -> PaddockResult<u64> {
        Ok(batch.len() as u64)
    }

    async fn ping(&self) -> PaddockResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_deadline_expiry_is_gateway_timeout() {
    let service = Arc::new(ScheduleService::new(
        Arc::new(StalledStore),
        Arc::new(InMemoryCacheBackend::new()),
        CacheConfig::default(),
    ));
    let app = create_router(service, Duration::from_millis(20));

    let (status, body) = post_json(&app, "GetRounds", json!({ "season": 2024 })).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["code"], "TIMEOUT");
}

/// Cache whose deletes take longer than the call deadline.
struct SlowDeleteCache {
    inner: Arc<InMemoryCacheBackend>,
}

#[async_trait]
impl CacheBackend for SlowDeleteCache {
    async fn get(&self, key: &str) -> PaddockResult<Option<Vec<u8>>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> PaddockResult<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> PaddockResult<bool> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.inner.delete(key).await
    }

    async fn stats(&self) -> PaddockResult<CacheStats> {
        self.inner.stats().await
    }
}

#[tokio::test]
async fn test_write_past_deadline_still_invalidates() {
    let inner = Arc::new(InMemoryCacheBackend::new());
    let service = Arc::new(ScheduleService::new(
        Arc::new(InMemoryDocumentStore::new()),
        Arc::new(SlowDeleteCache {
            inner: Arc::clone(&inner),
        }),
        CacheConfig::default(),
    ));
    let app = create_router(service, Duration::from_millis(10));

    inner
        .set("rounds:2024", b"[]".to_vec(), Duration::from_secs(60))
        .await
        .expect("cache set should succeed");

    let request = WriteRoundsRequest {
        rounds: vec![bahrain_round()],
    };
    let (status, body) = post(&app, "WriteRounds", serde_json::to_string(&request).unwrap()).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["code"], "TIMEOUT");

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(
        inner.get("rounds:2024").await.unwrap().is_none(),
        "stale aggregate key must be dropped once the write finishes"
    );
}

// ============================================================================
// HEALTH
// ============================================================================

#[tokio::test]
async fn test_health() {
    let (app, _store) = test_app();
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("request should build");

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store_ok"], true);
    assert_eq!(body["cache"]["entry_count"], 0);
}
