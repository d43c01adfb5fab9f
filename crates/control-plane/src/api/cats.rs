// Cat HTTP routes

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use cats_core::Cat;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common::{ApiError, ErrorResponse};
use crate::services::CatService;

/// Page size when `limit` is absent or out of range
pub const DEFAULT_PAGE_SIZE: i64 = 20;
/// Largest accepted `limit`
pub const MAX_PAGE_SIZE: i64 = 100;

/// Request to create a new cat
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateCatRequest {
    /// Display name of the cat.
    #[schema(example = "Mittens")]
    pub name: String,
    /// Age in whole years.
    #[serde(default)]
    #[schema(example = 3)]
    pub age_years: i32,
    #[serde(default)]
    #[schema(example = "Maine Coon")]
    pub breed: Option<String>,
    #[serde(default)]
    #[schema(example = "tabby")]
    pub coat_color: Option<String>,
    /// Weight in kilograms.
    #[serde(default)]
    #[schema(example = 4.5)]
    pub weight_kg: Option<f64>,
}

/// Query parameters for listing cats
///
/// Both are kept as raw strings: unparsable values fall back to defaults
/// instead of failing the request.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListCatsQuery {
    /// Page size, 1..=100 (default 20).
    pub limit: Option<String>,
    /// RFC 3339 timestamp from a previous page's `next_cursor`.
    pub cursor: Option<String>,
}

impl ListCatsQuery {
    fn page_size(&self) -> i64 {
        self.limit
            .as_deref()
            .and_then(|l| l.trim().parse::<i64>().ok())
            .filter(|l| (1..=MAX_PAGE_SIZE).contains(l))
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    fn cursor(&self) -> Option<DateTime<Utc>> {
        let raw = self.cursor.as_deref()?;
        match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(at) => Some(at.with_timezone(&Utc)),
            Err(e) => {
                tracing::debug!(cursor = %raw, error = %e, "Ignoring unparsable cursor");
                None
            }
        }
    }
}

/// One page of cats, newest first
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CatListResponse {
    pub items: Vec<Cat>,
    /// Cursor for the next (older) page. Absent on an empty page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "2024-05-01T12:00:00.123456Z")]
    pub next_cursor: Option<String>,
}

/// Format a cursor with microsecond precision so it round-trips exactly
pub fn format_cursor(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// App state for cat routes
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CatService>,
}

impl AppState {
    pub fn new(service: Arc<CatService>) -> Self {
        Self { service }
    }
}

/// Create cat routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/cats", get(list_cats).post(create_cat))
        .route("/cats/:id", get(get_cat))
        .with_state(state)
}

/// POST /cats - Create a new cat
#[utoipa::path(
    post,
    path = "/cats",
    request_body = CreateCatRequest,
    responses(
        (status = 201, description = "Cat created successfully", body = Cat),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "cats"
)]
pub async fn create_cat(
    State(state): State<AppState>,
    payload: Result<Json<CreateCatRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Cat>), ApiError> {
    let Json(req) = payload.map_err(|rejection| {
        ErrorResponse::new(rejection.body_text()).into_response(StatusCode::BAD_REQUEST)
    })?;

    let cat = state.service.create(req).await.map_err(|e| {
        tracing::error!("Failed to create cat: {:#}", e);
        ErrorResponse::new("failed to create cat").into_response(StatusCode::INTERNAL_SERVER_ERROR)
    })?;

    Ok((StatusCode::CREATED, Json(cat)))
}

/// GET /cats/{id} - Get a cat by id
#[utoipa::path(
    get,
    path = "/cats/{id}",
    params(
        ("id" = i64, Path, description = "Cat ID")
    ),
    responses(
        (status = 200, description = "Cat found", body = Cat),
        (status = 400, description = "Invalid cat ID", body = ErrorResponse),
        (status = 404, description = "Cat not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "cats"
)]
pub async fn get_cat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Cat>, ApiError> {
    let id = id
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ErrorResponse::new("invalid id").into_response(StatusCode::BAD_REQUEST))?;

    let cat = state.service.get(id).await.map_err(|e| {
        tracing::error!(cat_id = id, "Failed to get cat: {:#}", e);
        ErrorResponse::new("failed to get cat").into_response(StatusCode::INTERNAL_SERVER_ERROR)
    })?;

    cat.map(Json)
        .ok_or_else(|| ErrorResponse::new("cat not found").into_response(StatusCode::NOT_FOUND))
}

/// GET /cats - List cats, newest first
#[utoipa::path(
    get,
    path = "/cats",
    params(ListCatsQuery),
    responses(
        (status = 200, description = "Page of cats", body = CatListResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "cats"
)]
pub async fn list_cats(
    State(state): State<AppState>,
    Query(query): Query<ListCatsQuery>,
) -> Result<Json<CatListResponse>, ApiError> {
    let page = state
        .service
        .list(query.page_size(), query.cursor())
        .await
        .map_err(|e| {
            tracing::error!("Failed to list cats: {:#}", e);
            ErrorResponse::new("failed to list cats")
                .into_response(StatusCode::INTERNAL_SERVER_ERROR)
        })?;

    Ok(Json(CatListResponse {
        items: page.items,
        next_cursor: page.next_cursor.map(format_cursor),
    }))
}
