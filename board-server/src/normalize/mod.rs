//! Normalization of upstream payloads into the canonical schema.
//!
//! The upstream APIs are loose about shape: list fields collapse to bare
//! objects, field names differ between response revisions, and times
//! arrive in several formats. Everything downstream of this module sees
//! one stable schema:
//! - departures/arrivals items become [`CanonicalItem`]s
//! - trip-search payloads get a guaranteed `Trip`/`LegList.Leg` list
//!   shape with deterministic ordering, then project to [`Trip`]s
//!
//! No function here fails on bad input; malformed pieces are defaulted,
//! skipped, or sorted last.

mod duration;
mod item;
mod trip;

pub use duration::parse_duration_minutes;
pub use item::{CanonicalItem, parse_item_datetime, project_batch, project_item, sort_items};
pub use trip::{Leg, Trip, normalize_trip_payload, parse_leg_datetime, project_trips};
