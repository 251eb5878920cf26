//! Published snapshots of a source's most recent successful fetch.

use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;

use crate::normalize::{CanonicalItem, Trip};

/// The normalized payload of one successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnapshotData {
    /// Departure or arrival board for a single stop.
    Board {
        stop_name: String,
        items: Vec<CanonicalItem>,
    },
    /// Trip search results.
    Trips { trips: Vec<Trip> },
}

/// An immutable published snapshot.
///
/// Readers only ever see a whole snapshot: the engine builds a new one
/// off to the side and swaps it in, so a failed refresh leaves the
/// previous snapshot fully intact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub data: SnapshotData,
    pub last_successful_update: DateTime<Utc>,
}

impl Snapshot {
    /// Wrap freshly fetched data with the current publication time,
    /// truncated to whole seconds.
    pub fn published_now(data: SnapshotData) -> Self {
        Self {
            data,
            last_successful_update: Utc::now().trunc_subsecs(0),
        }
    }
}
