//! Projection of snapshots into what a departure board actually shows:
//! filtered rows, countdown strings, and the next departure headline.

mod locale;

pub use locale::Locale;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::engine::{Snapshot, SnapshotData, SourceConfig};
use crate::normalize::{CanonicalItem, Trip, parse_item_datetime, parse_leg_datetime};

/// One row of a rendered board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartureRow {
    pub line: String,
    pub destination: String,
    pub direction: String,
    /// Countdown string, e.g. "now", "1 min", "12 min", or a clock
    /// time when the timestamp could not be parsed.
    pub display_time: String,
    pub minutes_until: Option<i64>,
    pub scheduled_time: String,
    pub expected_time: String,
    pub transport_mode: String,
    pub is_realtime: bool,
    pub canceled: bool,
    pub platform: String,
}

/// A board ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardView {
    pub stop_name: String,
    /// Countdown of the first row, or the locale's "no departures".
    pub next_departure: String,
    pub rows: Vec<DepartureRow>,
    pub last_successful_update: DateTime<Utc>,
}

/// A trip annotated with minutes until its first leg departs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripView {
    pub minutes_until: Option<i64>,
    pub trip: Trip,
}

/// Project a board snapshot through the source's filters and time
/// window into display rows.
///
/// `now` is local wall-clock time, matching the timestamps the API
/// returns. Items whose effective time cannot be parsed stay on the
/// board with their raw time string rather than being dropped.
pub fn project_board(
    snapshot: &Snapshot,
    config: &SourceConfig,
    now: NaiveDateTime,
    locale: Locale,
) -> BoardView {
    let (stop_name, items) = match &snapshot.data {
        SnapshotData::Board { stop_name, items } => (stop_name.clone(), items.as_slice()),
        SnapshotData::Trips { .. } => (String::new(), [].as_slice()),
    };

    let rows: Vec<DepartureRow> = items
        .iter()
        .filter(|item| passes_filters(item, config))
        .filter_map(|item| make_row(item, config, now, locale))
        .collect();

    let next_departure = rows
        .first()
        .map(|row| row.display_time.clone())
        .unwrap_or_else(|| locale.no_departures().to_string());

    BoardView {
        stop_name,
        next_departure,
        rows,
        last_successful_update: snapshot.last_successful_update,
    }
}

/// Project a trip snapshot, annotating each trip with the countdown to
/// its first leg.
pub fn project_trips_view(snapshot: &Snapshot, now: NaiveDateTime) -> Vec<TripView> {
    let SnapshotData::Trips { trips } = &snapshot.data else {
        return Vec::new();
    };

    trips
        .iter()
        .map(|trip| TripView {
            minutes_until: trip
                .legs
                .first()
                .and_then(|leg| parse_leg_datetime(&leg.origin_time))
                .map(|departs| (departs - now).num_minutes()),
            trip: trip.clone(),
        })
        .collect()
}

fn passes_filters(item: &CanonicalItem, config: &SourceConfig) -> bool {
    if !config.line_filter.is_empty() && !config.line_filter.contains(&item.line) {
        return false;
    }
    if !config.destination_filter.is_empty() {
        let destination = item.destination.to_lowercase();
        if !config
            .destination_filter
            .iter()
            .any(|needle| destination.contains(needle))
        {
            return false;
        }
    }
    true
}

fn make_row(
    item: &CanonicalItem,
    config: &SourceConfig,
    now: NaiveDateTime,
    locale: Locale,
) -> Option<DepartureRow> {
    // Realtime estimate when present, otherwise the timetable.
    let effective = if item.expected_time.is_empty() {
        &item.scheduled_time
    } else {
        &item.expected_time
    };

    let minutes_until = parse_item_datetime(effective).map(|when| (when - now).num_minutes());

    // The time window only applies to items we could actually place in
    // time; an unparsable timestamp is kept and shown raw.
    if let Some(mins) = minutes_until
        && mins > i64::from(config.time_window_mins)
    {
        return None;
    }

    let display_time = match minutes_until {
        Some(mins) if mins <= 0 => locale.departs_now().to_string(),
        Some(1) => locale.one_minute().to_string(),
        Some(mins) => locale.minutes(mins),
        None => clock_suffix(effective)
            .unwrap_or_else(|| locale.unknown().to_string()),
    };

    Some(DepartureRow {
        line: item.line.clone(),
        destination: item.destination.clone(),
        direction: item.direction.clone(),
        display_time,
        minutes_until,
        scheduled_time: item.scheduled_time.clone(),
        expected_time: item.expected_time.clone(),
        transport_mode: item.transport_mode.clone(),
        is_realtime: item.is_realtime,
        canceled: item.canceled,
        platform: item.platform.clone(),
    })
}

/// Trailing "HH:MM" of a raw timestamp string, if it is long enough.
fn clock_suffix(raw: &str) -> Option<String> {
    let raw = raw.trim();
    raw.get(raw.len().checked_sub(5)?..)
        .filter(|tail| tail.contains(':'))
        .map(str::to_string)
}
