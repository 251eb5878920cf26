//! Periodic refresh of a single transit data source.
//!
//! One [`RefreshEngine`] owns one source: it fetches on an interval
//! (gated by an optional update condition), normalizes the payload,
//! and publishes an immutable [`Snapshot`] that web handlers read.

mod condition;
mod config;
mod coordinator;
mod snapshot;

pub use condition::{ConditionError, LiteralCondition, UpdatePredicate, coerce_to_bool};
pub use config::{
    DEFAULT_REFRESH_INTERVAL, DEFAULT_TIME_WINDOW_MINS, FetchMode, MINIMUM_REFRESH_INTERVAL,
    SourceConfig,
};
pub use coordinator::{EnginePhase, RefreshEngine, RefreshError};
pub use snapshot::{Snapshot, SnapshotData};
