//! Request and response shapes for the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::display::TripView;
use crate::engine::{EnginePhase, Snapshot};

#[derive(Debug, Deserialize)]
pub struct BoardQuery {
    /// Locale tag ("en" or "sv"); falls back to the server default.
    pub locale: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StopSearchQuery {
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub phase: EnginePhase,
    pub last_successful_update: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub snapshot: Option<Snapshot>,
}

#[derive(Debug, Serialize)]
pub struct TripsResponse {
    pub num_trips: usize,
    pub trips: Vec<TripView>,
    pub last_successful_update: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub phase: EnginePhase,
    pub last_error: Option<String>,
}
