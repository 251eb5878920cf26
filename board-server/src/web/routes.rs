use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Local;

use crate::display::{self, BoardView, Locale};
use crate::stops::StopLookupResult;

use super::dto::{BoardQuery, RefreshResponse, StatusResponse, StopSearchQuery, TripsResponse};
use super::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/snapshot", get(snapshot))
        .route("/api/board", get(board))
        .route("/api/trips", get(trips))
        .route("/api/stops/search", get(stop_search))
        .route("/api/refresh", post(refresh))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Engine status plus the raw current snapshot.
async fn snapshot(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        phase: state.engine.phase().await,
        last_successful_update: state.engine.last_successful_update().await,
        last_error: state.engine.last_error().await,
        snapshot: state.engine.snapshot().await,
    })
}

/// The filtered, countdown-annotated departure board.
async fn board(
    State(state): State<AppState>,
    Query(query): Query<BoardQuery>,
) -> Result<Json<BoardView>, StatusCode> {
    let snapshot = state
        .engine
        .snapshot()
        .await
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    let config = state.engine.config().await;
    let locale = query
        .locale
        .as_deref()
        .and_then(Locale::parse)
        .unwrap_or(state.default_locale);

    Ok(Json(display::project_board(
        &snapshot,
        &config,
        Local::now().naive_local(),
        locale,
    )))
}

async fn trips(State(state): State<AppState>) -> Result<Json<TripsResponse>, StatusCode> {
    let snapshot = state
        .engine
        .snapshot()
        .await
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    let trips = display::project_trips_view(&snapshot, Local::now().naive_local());

    Ok(Json(TripsResponse {
        num_trips: trips.len(),
        trips,
        last_successful_update: snapshot.last_successful_update,
    }))
}

async fn stop_search(
    State(state): State<AppState>,
    Query(query): Query<StopSearchQuery>,
) -> Json<StopLookupResult> {
    Json(state.stops.lookup(&query.q).await.as_ref().clone())
}

/// Trigger an out-of-schedule refresh and report how it went.
async fn refresh(State(state): State<AppState>) -> Json<RefreshResponse> {
    state.engine.refresh_now_and_wait().await;
    Json(RefreshResponse {
        phase: state.engine.phase().await,
        last_error: state.engine.last_error().await,
    })
}
