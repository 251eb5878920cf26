//! Per-source refresh configuration.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::trafiklab::TripQuery;

use super::condition::{LiteralCondition, UpdatePredicate};

/// Default refresh period.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// Floor for the refresh period; the upstream rate limits make anything
/// faster pointless.
pub const MINIMUM_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Default look-ahead window in minutes.
pub const DEFAULT_TIME_WINDOW_MINS: u32 = 60;

/// What a source fetches each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Departures,
    Arrivals,
    TripSearch,
}

/// Configuration for one data source.
///
/// Immutable per refresh cycle: the engine loads an `Arc<SourceConfig>`
/// at the start of a cycle and a configuration update swaps in a new
/// `Arc` for the next one; a fetch never observes a half-applied change.
#[derive(Clone)]
pub struct SourceConfig {
    pub mode: FetchMode,
    /// Stop/area id, for the departures/arrivals modes.
    pub stop_id: String,
    /// Trip query, for the trip-search mode.
    pub trip: Option<TripQuery>,
    /// Line designations to keep at display time (empty = no filter).
    pub line_filter: HashSet<String>,
    /// Lowercase destination substrings to keep (empty = no filter).
    pub destination_filter: HashSet<String>,
    /// Look-ahead window in minutes, 1–1440.
    pub time_window_mins: u32,
    /// Time between scheduled refreshes, floored at one minute.
    pub refresh_interval: Duration,
    /// Gate evaluated before each scheduled fetch (`None` = always).
    pub update_condition: Option<Arc<dyn UpdatePredicate>>,
}

impl SourceConfig {
    fn base(mode: FetchMode) -> Self {
        Self {
            mode,
            stop_id: String::new(),
            trip: None,
            line_filter: HashSet::new(),
            destination_filter: HashSet::new(),
            time_window_mins: DEFAULT_TIME_WINDOW_MINS,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            update_condition: None,
        }
    }

    /// Departure board for a stop/area id.
    pub fn departures(stop_id: impl Into<String>) -> Self {
        Self {
            stop_id: stop_id.into(),
            ..Self::base(FetchMode::Departures)
        }
    }

    /// Arrival board for a stop/area id.
    pub fn arrivals(stop_id: impl Into<String>) -> Self {
        Self {
            stop_id: stop_id.into(),
            ..Self::base(FetchMode::Arrivals)
        }
    }

    /// Trip search between an origin and a destination.
    pub fn trip_search(query: TripQuery) -> Self {
        Self {
            trip: Some(query),
            ..Self::base(FetchMode::TripSearch)
        }
    }

    /// Keep only these line designations.
    pub fn with_line_filter<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.line_filter = lines
            .into_iter()
            .map(|line| line.into().trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();
        self
    }

    /// Keep only these line designations, from a comma-separated string.
    pub fn with_line_filter_str(self, lines: &str) -> Self {
        self.with_line_filter(lines.split(','))
    }

    /// Keep only destinations containing one of these substrings
    /// (matched case-insensitively).
    pub fn with_destination_filter<I, S>(mut self, needles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.destination_filter = needles
            .into_iter()
            .map(|needle| needle.into().trim().to_lowercase())
            .filter(|needle| !needle.is_empty())
            .collect();
        self
    }

    /// Destination filter from a comma-separated string.
    pub fn with_destination_filter_str(self, needles: &str) -> Self {
        self.with_destination_filter(needles.split(','))
    }

    /// Set the look-ahead window (clamped to 1–1440 minutes).
    pub fn with_time_window_mins(mut self, mins: u32) -> Self {
        self.time_window_mins = mins.clamp(1, 1440);
        self
    }

    /// Set the refresh period (floored at the minimum interval).
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval.max(MINIMUM_REFRESH_INTERVAL);
        self
    }

    /// Gate scheduled fetches behind a predicate.
    pub fn with_update_condition(mut self, predicate: Arc<dyn UpdatePredicate>) -> Self {
        self.update_condition = Some(predicate);
        self
    }

    /// Gate from a plain configuration string; empty means "always
    /// update".
    pub fn with_update_condition_str(mut self, expr: &str) -> Self {
        let expr = expr.trim();
        self.update_condition = if expr.is_empty() {
            None
        } else {
            Some(Arc::new(LiteralCondition(expr.to_string())))
        };
        self
    }
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("mode", &self.mode)
            .field("stop_id", &self.stop_id)
            .field("trip", &self.trip)
            .field("line_filter", &self.line_filter)
            .field("destination_filter", &self.destination_filter)
            .field("time_window_mins", &self.time_window_mins)
            .field("refresh_interval", &self.refresh_interval)
            .field(
                "update_condition",
                &self.update_condition.as_ref().map(|_| "<predicate>"),
            )
            .finish()
    }
}
