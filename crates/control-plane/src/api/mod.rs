// HTTP API routes
//
// Each submodule handles a specific resource type with its own state.
// `router` assembles them with the shared middleware stack.

pub mod cats;
pub mod common;
pub mod health;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderName, Request};
use axum::Router;
use cats_worker::TaskPool;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::openapi::ApiDoc;
use crate::services::CatService;

// Re-export common types
pub use common::{ApiError, ErrorResponse};

/// Header carrying the per-request correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the full application router
pub fn router(service: Arc<CatService>, pool: Arc<TaskPool>) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .merge(health::routes(health::HealthState::new(pool)))
        .merge(cats::routes(cats::AppState::new(service)))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Innermost first: panics become 500s before tracing sees the response
        .layer(CatchPanicLayer::new())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::TracingThumbnailGenerator;
    use crate::storage::StorageBackend;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app() -> Router {
        let pool = Arc::new(TaskPool::new(1));
        let service = Arc::new(CatService::new(
            StorageBackend::in_memory(),
            Arc::clone(&pool),
            Arc::new(TracingThumbnailGenerator::new()),
            Duration::from_secs(5),
        ));
        router(service, pool)
    }

    #[tokio::test]
    async fn test_request_id_generated_and_returned() {
        let response = app()
            .oneshot(Request::builder().uri("/live").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let id = response.headers().get(REQUEST_ID_HEADER).unwrap();
        assert!(!id.is_empty());
    }

    #[tokio::test]
    async fn test_request_id_propagated_from_caller() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/live")
                    .header(REQUEST_ID_HEADER, "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers().get(REQUEST_ID_HEADER).unwrap(), "abc-123");
    }

    #[tokio::test]
    async fn test_openapi_document_served() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api-doc/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(doc["paths"]["/cats"].is_object());
        assert!(doc["paths"]["/cats/{id}"].is_object());
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = app()
            .oneshot(Request::builder().uri("/dogs").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
