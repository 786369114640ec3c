//! HTTP endpoints

use axum::{
    extract::{rejection::QueryRejection, FromRequestParts, Path, Query, State},
    http::request::Parts,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use occur_core::models::{EventId, Occurrence, Window};
use occur_core::store::Principal;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;

/// Header naming the caller whose events are queried.
pub const PRINCIPAL_HEADER: &str = "x-principal";

/// `limit` used by `/events/{id}/upcoming` when the caller gives none.
pub const DEFAULT_UPCOMING: usize = 10;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/occurrences", get(list_occurrences))
        .route("/events/{id}/upcoming", get(upcoming))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// The principal taken from the `x-principal` header.
#[derive(Debug, Clone)]
pub struct Caller(pub Principal);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(PRINCIPAL_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| Caller(Principal::new(value)))
            .ok_or_else(|| AppError::bad_request(format!("missing {} header", PRINCIPAL_HEADER)))
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[derive(Debug, Deserialize)]
pub struct WindowParams {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// GET /occurrences?start=..&end=.. - Every occurrence of the caller's events in the window
async fn list_occurrences(
    State(state): State<AppState>,
    Caller(principal): Caller,
    params: Result<Query<WindowParams>, QueryRejection>,
) -> Result<Json<Vec<Occurrence>>, AppError> {
    let Query(params) = params?;
    let window = Window::new(params.start, params.end);
    state.check_window(&window)?;

    let events = state.store().events_for(&principal).await?;
    let occurrences = state.service().query(&events, &window);

    tracing::info!(
        principal = %principal,
        start = %window.start,
        end = %window.end,
        occurrences = occurrences.len(),
        "resolved occurrences"
    );
    Ok(Json(occurrences))
}

#[derive(Debug, Deserialize)]
pub struct UpcomingParams {
    pub from: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

/// GET /events/{id}/upcoming?from=..&limit=.. - The next occurrences of one event
async fn upcoming(
    State(state): State<AppState>,
    Caller(principal): Caller,
    Path(id): Path<String>,
    params: Result<Query<UpcomingParams>, QueryRejection>,
) -> Result<Json<Vec<Occurrence>>, AppError> {
    let Query(params) = params?;
    let from = params.from.unwrap_or_else(Utc::now);
    let limit = params
        .limit
        .unwrap_or(DEFAULT_UPCOMING)
        .min(state.limits().max_upcoming);

    let id = EventId::new(id);
    let event = state
        .store()
        .find_event(&principal, &id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Event not found: {}", id)))?;

    let occurrences = state.service().upcoming(std::slice::from_ref(&event), from, limit);

    tracing::debug!(event = %id, from = %from, limit, returned = occurrences.len(), "upcoming occurrences");
    Ok(Json(occurrences))
}
