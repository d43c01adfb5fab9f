// Liveness and health endpoints

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use cats_worker::{PoolStatsSnapshot, TaskPool};
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    pool: Arc<TaskPool>,
}

impl HealthState {
    pub fn new(pool: Arc<TaskPool>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub worker_pool: WorkerPoolHealth,
}

#[derive(Debug, Serialize)]
pub struct WorkerPoolHealth {
    pub concurrency: usize,
    pub workers: usize,
    pub closed: bool,
    #[serde(flatten)]
    pub stats: PoolStatsSnapshot,
    pub queued: u64,
}

pub fn routes(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/live", get(live))
        .with_state(state)
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    let pool = &state.pool;
    let stats = pool.stats();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        worker_pool: WorkerPoolHealth {
            concurrency: pool.concurrency(),
            workers: pool.worker_count(),
            closed: pool.is_closed(),
            queued: stats.queued(),
            stats,
        },
    })
}

async fn live() -> &'static str {
    "."
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_reports_pool() {
        let pool = Arc::new(TaskPool::new(3));
        pool.start();
        let app = routes(HealthState::new(Arc::clone(&pool)));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["worker_pool"]["concurrency"], 3);
        assert_eq!(json["worker_pool"]["workers"], 3);
        assert_eq!(json["worker_pool"]["closed"], false);
        assert_eq!(json["worker_pool"]["submitted"], 0);
        assert_eq!(json["worker_pool"]["queued"], 0);

        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_live_heartbeat() {
        let app = routes(HealthState::new(Arc::new(TaskPool::new(1))));

        let response = app
            .oneshot(Request::builder().uri("/live").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b".");
    }
}
