//! Stop search and caching.

mod lookup;

pub use lookup::{ChildStop, StopCacheConfig, StopDirectory, StopLookupResult, StopMatch};
