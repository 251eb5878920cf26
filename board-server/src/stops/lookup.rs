//! Free-text stop lookup with a short-lived in-memory cache.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::trafiklab::TransitApi;

/// Cache tuning for stop lookups.
#[derive(Debug, Clone, Copy)]
pub struct StopCacheConfig {
    pub ttl: Duration,
    pub max_capacity: u64,
}

impl Default for StopCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(600),
            max_capacity: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildStop {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopMatch {
    pub id: String,
    pub name: String,
    pub area_type: String,
    pub transport_modes: Vec<String>,
    pub average_daily_departures: i64,
    pub child_stops: Vec<ChildStop>,
}

/// The outcome of a lookup. Never an error at the call site: upstream
/// failures are folded into `error` alongside an empty match list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopLookupResult {
    pub query: String,
    pub stops: Vec<StopMatch>,
    pub error: Option<String>,
}

/// Cached stop lookups against the transit API.
pub struct StopDirectory {
    api: Arc<dyn TransitApi>,
    cache: Cache<String, Arc<StopLookupResult>>,
}

impl StopDirectory {
    pub fn new(api: Arc<dyn TransitApi>, config: StopCacheConfig) -> Self {
        Self {
            api,
            cache: Cache::builder()
                .time_to_live(config.ttl)
                .max_capacity(config.max_capacity)
                .build(),
        }
    }

    /// Look up stops matching `query`. Only successful lookups are
    /// cached, so a transient upstream failure is retried on the next
    /// request rather than pinned for the TTL.
    pub async fn lookup(&self, query: &str) -> Arc<StopLookupResult> {
        let key = query.trim().to_lowercase();
        if let Some(hit) = self.cache.get(&key).await {
            debug!(query, "stop lookup served from cache");
            return hit;
        }

        let result = Arc::new(self.fetch(query).await);
        if result.error.is_none() {
            self.cache.insert(key, result.clone()).await;
        }
        result
    }

    async fn fetch(&self, query: &str) -> StopLookupResult {
        match self.api.stop_lookup(query).await {
            Ok(payload) => parse_lookup(query, &payload),
            Err(err) => {
                warn!(query, error = %err, "stop lookup failed");
                StopLookupResult {
                    query: query.to_string(),
                    stops: Vec::new(),
                    error: Some(err.to_string()),
                }
            }
        }
    }
}

fn parse_lookup(query: &str, payload: &Value) -> StopLookupResult {
    let Some(groups) = payload.get("stop_groups").and_then(Value::as_array) else {
        return StopLookupResult {
            query: query.to_string(),
            stops: Vec::new(),
            error: Some("no stops found".to_string()),
        };
    };

    StopLookupResult {
        query: query.to_string(),
        stops: groups.iter().map(parse_group).collect(),
        error: None,
    }
}

fn parse_group(group: &Value) -> StopMatch {
    let text = |key: &str| {
        group
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    StopMatch {
        id: text("id"),
        name: text("name"),
        area_type: text("area_type"),
        transport_modes: group
            .get("transport_modes")
            .and_then(Value::as_array)
            .map(|modes| {
                modes
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        average_daily_departures: group
            .get("average_daily_stop_times")
            .and_then(Value::as_i64)
            .unwrap_or_default(),
        child_stops: group
            .get("stops")
            .and_then(Value::as_array)
            .map(|stops| stops.iter().map(parse_child).collect())
            .unwrap_or_default(),
    }
}

fn parse_child(stop: &Value) -> ChildStop {
    ChildStop {
        id: stop
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        name: stop
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        lat: stop.get("lat").and_then(Value::as_f64).unwrap_or_default(),
        lon: stop.get("lon").and_then(Value::as_f64).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trafiklab::mock::{MockFailure, MockTransitApi, Op};
    use serde_json::json;

    fn lookup_payload() -> Value {
        json!({
            "stop_groups": [{
                "id": "740098000",
                "name": "Stockholm Odenplan",
                "area_type": "META_STOP",
                "transport_modes": ["BUS", "METRO"],
                "average_daily_stop_times": 2215,
                "stops": [
                    {"id": "740020101", "name": "Odenplan T-bana", "lat": 59.342874, "lon": 18.049279},
                ],
            }],
        })
    }

    #[tokio::test]
    async fn parses_stop_groups() {
        let api = Arc::new(MockTransitApi::new());
        api.respond(Op::StopLookup, lookup_payload());
        let directory = StopDirectory::new(api, StopCacheConfig::default());

        let result = directory.lookup("odenplan").await;
        assert!(result.error.is_none());
        assert_eq!(result.stops.len(), 1);
        let stop = &result.stops[0];
        assert_eq!(stop.id, "740098000");
        assert_eq!(stop.transport_modes, vec!["BUS", "METRO"]);
        assert_eq!(stop.average_daily_departures, 2215);
        assert_eq!(stop.child_stops[0].name, "Odenplan T-bana");
    }

    #[tokio::test]
    async fn missing_stop_groups_is_reported_not_raised() {
        let api = Arc::new(MockTransitApi::new());
        api.respond(Op::StopLookup, json!({"unexpected": true}));
        let directory = StopDirectory::new(api, StopCacheConfig::default());

        let result = directory.lookup("nowhere").await;
        assert!(result.stops.is_empty());
        assert_eq!(result.error.as_deref(), Some("no stops found"));
    }

    #[tokio::test]
    async fn api_failure_is_folded_into_result() {
        let api = Arc::new(MockTransitApi::new());
        api.fail(Op::StopLookup, MockFailure::Timeout);
        let directory = StopDirectory::new(api, StopCacheConfig::default());

        let result = directory.lookup("odenplan").await;
        assert!(result.stops.is_empty());
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let api = Arc::new(MockTransitApi::new());
        api.fail(Op::StopLookup, MockFailure::Timeout);
        let directory = StopDirectory::new(api.clone(), StopCacheConfig::default());

        directory.lookup("odenplan").await;
        api.respond(Op::StopLookup, lookup_payload());
        let result = directory.lookup("odenplan").await;

        assert_eq!(api.calls(Op::StopLookup), 2);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn successful_lookups_hit_the_cache() {
        let api = Arc::new(MockTransitApi::new());
        api.respond(Op::StopLookup, lookup_payload());
        let directory = StopDirectory::new(api.clone(), StopCacheConfig::default());

        directory.lookup("Odenplan").await;
        directory.lookup("  odenplan ").await;

        assert_eq!(api.calls(Op::StopLookup), 1);
    }
}
