//! Trafiklab realtime + ResRobot transport client.
//!
//! This module owns the HTTP boundary to the upstream services:
//! - Trafiklab realtime API: departures, arrivals, stop lookup by name
//! - ResRobot travel planner: multi-leg trip search
//!
//! Payloads come back as raw `serde_json::Value` because upstream
//! response shapes vary across revisions; the `normalize` module turns
//! them into the canonical schema. Failures are typed
//! (`TrafiklabError`), and no operation retries internally.

mod client;
mod error;
pub mod mock;

pub use client::{
    Place, PlaceParseError, TrafiklabClient, TrafiklabConfig, TransitApi, TripQuery,
};
pub use error::TrafiklabError;
