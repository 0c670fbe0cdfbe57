//! JSON RPC boundary.
//!
//! One `POST /rpc/<Method>` route per facade operation plus `GET /health`.
//! Bodies are decoded before the facade is reached, so a malformed filter
//! (a non-numeric season, say) is an `INVALID_INPUT` 400 and never a domain
//! error. Every call runs under the configured deadline; expiry is a 504. Writes
//! keep running past expiry so invalidation always follows the upsert.
//! Write failures are not HTTP errors: the outcome carries `success=false`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use paddock_core::{
    Round, RoundsFilter, RoundsResponse, Season, SeasonsFilter, SeasonsResponse, WriteOutcome,
};
use paddock_storage::{CacheBackend, DocumentStore};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::{ApiError, ApiResult};
use crate::service::ScheduleService;

// ============================================================================
// REQUEST TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRoundRequest {
    pub season: i32,
    pub round_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteSeasonsRequest {
    pub seasons: Vec<Season>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteRoundsRequest {
    pub rounds: Vec<Round>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetRoundResponse {
    pub round: Round,
}

// ============================================================================
// STATE
// ============================================================================

pub struct RpcState<S, C>
where
    S: DocumentStore,
    C: CacheBackend,
{
    service: Arc<ScheduleService<S, C>>,
    call_timeout: Duration,
}

impl<S, C> Clone for RpcState<S, C>
where
    S: DocumentStore,
    C: CacheBackend,
{
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            call_timeout: self.call_timeout,
        }
    }
}

impl<S, C> RpcState<S, C>
where
    S: DocumentStore,
    C: CacheBackend,
{
    async fn bounded<T, F>(&self, operation: &str, call: F) -> ApiResult<T>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout(self.call_timeout, call)
            .await
            .map_err(|_| self.expired(operation))
    }

    /// Like `bounded`, but the call runs on its own task and keeps going
    /// after the deadline. Writes use this so an upsert that has committed
    /// still gets its cache keys invalidated.
    async fn bounded_detached<T, F>(&self, operation: &str, call: F) -> ApiResult<T>
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
    {
        let task = tokio::spawn(call);
        match tokio::time::timeout(self.call_timeout, task).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(join_error)) => {
                error!(operation, error = %join_error, "detached call failed");
                Err(ApiError::internal_error(join_error.to_string()))
            }
            Err(_) => Err(self.expired(operation)),
        }
    }

    fn expired(&self, operation: &str) -> ApiError {
        let timeout_ms = u64::try_from(self.call_timeout.as_millis()).unwrap_or(u64::MAX);
        warn!(operation, timeout_ms, "call deadline expired");
        ApiError::timeout(operation)
    }
}

fn decode<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::invalid_input(rejection.body_text()))
}

// ============================================================================
// HANDLERS
// ============================================================================

async fn get_seasons<S, C>(
    State(state): State<RpcState<S, C>>,
    payload: Result<Json<SeasonsFilter>, JsonRejection>,
) -> ApiResult<Json<SeasonsResponse>>
where
    S: DocumentStore + 'static,
    C: CacheBackend + 'static,
{
    let filter = decode(payload)?;
    let response = state
        .bounded("GetSeasons", state.service.get_seasons(filter))
        .await??;
    Ok(Json(response))
}

async fn get_rounds<S, C>(
    State(state): State<RpcState<S, C>>,
    payload: Result<Json<RoundsFilter>, JsonRejection>,
) -> ApiResult<Json<RoundsResponse>>
where
    S: DocumentStore + 'static,
    C: CacheBackend + 'static,
{
    let filter = decode(payload)?;
    let response = state
        .bounded("GetRounds", state.service.get_rounds(filter))
        .await??;
    Ok(Json(response))
}

async fn get_round<S, C>(
    State(state): State<RpcState<S, C>>,
    payload: Result<Json<GetRoundRequest>, JsonRejection>,
) -> ApiResult<Json<GetRoundResponse>>
where
    S: DocumentStore + 'static,
    C: CacheBackend + 'static,
{
    let request = decode(payload)?;
    let round = state
        .bounded(
            "GetRound",
            state.service.get_round(request.season, request.round_id),
        )
        .await??;
    Ok(Json(GetRoundResponse { round }))
}

async fn write_seasons<S, C>(
    State(state): State<RpcState<S, C>>,
    payload: Result<Json<WriteSeasonsRequest>, JsonRejection>,
) -> ApiResult<Json<WriteOutcome>>
where
    S: DocumentStore + 'static,
    C: CacheBackend + 'static,
{
    let request = decode(payload)?;
    let service = Arc::clone(&state.service);
    let outcome = state
        .bounded_detached("WriteSeasons", async move {
            service.write_seasons(request.seasons).await
        })
        .await?;
    Ok(Json(outcome))
}

async fn write_rounds<S, C>(
    State(state): State<RpcState<S, C>>,
    payload: Result<Json<WriteRoundsRequest>, JsonRejection>,
) -> ApiResult<Json<WriteOutcome>>
where
    S: DocumentStore + 'static,
    C: CacheBackend + 'static,
{
    let request = decode(payload)?;
    let service = Arc::clone(&state.service);
    let outcome = state
        .bounded_detached("WriteRounds", async move {
            service.write_rounds(request.rounds).await
        })
        .await?;
    Ok(Json(outcome))
}

/// GET /health - 200 when the store answers, 503 otherwise.
async fn health<S, C>(State(state): State<RpcState<S, C>>) -> impl IntoResponse
where
    S: DocumentStore + 'static,
    C: CacheBackend + 'static,
{
    match state.bounded("Health", state.service.health()).await {
        Ok(report) => {
            let status = if report.store_ok {
                StatusCode::OK
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            };
            (status, Json(report)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Build the RPC router over a shared facade.
pub fn create_router<S, C>(service: Arc<ScheduleService<S, C>>, call_timeout: Duration) -> Router
where
    S: DocumentStore + 'static,
    C: CacheBackend + 'static,
{
    let state = RpcState {
        service,
        call_timeout,
    };

    Router::new()
        .route("/rpc/GetSeasons", post(get_seasons::<S, C>))
        .route("/rpc/GetRounds", post(get_rounds::<S, C>))
        .route("/rpc/GetRound", post(get_round::<S, C>))
        .route("/rpc/WriteSeasons", post(write_seasons::<S, C>))
        .route("/rpc/WriteRounds", post(write_rounds::<S, C>))
        .route("/health", get(health::<S, C>))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_round_request_rejects_text_ids() {
        let err = serde_json::from_str::<GetRoundRequest>(r#"{"season":"2024","round_id":1}"#);
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        use paddock_storage::{CacheConfig, InMemoryCacheBackend, InMemoryDocumentStore};

        let state = RpcState {
            service: Arc::new(ScheduleService::new(
                Arc::new(InMemoryDocumentStore::new()),
                Arc::new(InMemoryCacheBackend::new()),
                CacheConfig::default(),
            )),
            call_timeout: Duration::from_millis(10),
        };

        let err = state
            .bounded("Sleep", tokio::time::sleep(Duration::from_secs(5)))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);

        let value = state.bounded("Ready", async { 7 }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_bounded_detached_finishes_after_deadline() {
        use paddock_storage::{CacheConfig, InMemoryCacheBackend, InMemoryDocumentStore};
        use std::sync::atomic::{AtomicBool, Ordering};

        let state = RpcState {
            service: Arc::new(ScheduleService::new(
                Arc::new(InMemoryDocumentStore::new()),
                Arc::new(InMemoryCacheBackend::new()),
                CacheConfig::default(),
            )),
            call_timeout: Duration::from_millis(10),
        };

        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let err = state
            .bounded_detached("SlowWrite", async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                flag.store(true, Ordering::SeqCst);
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert!(!finished.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(finished.load(Ordering::SeqCst), "detached call must run to completion");
    }

    #[test]
    fn test_expired_saturates_huge_deadlines() {
        use paddock_storage::{CacheConfig, InMemoryCacheBackend, InMemoryDocumentStore};

        let state = RpcState {
            service: Arc::new(ScheduleService::new(
                Arc::new(InMemoryDocumentStore::new()),
                Arc::new(InMemoryCacheBackend::new()),
                CacheConfig::default(),
            )),
            call_timeout: Duration::MAX,
        };
        let err = state.expired("Forever");
        assert_eq!(err.code, crate::error::ErrorCode::Timeout);
        assert!(err.message.contains("Forever"));
    }
}
