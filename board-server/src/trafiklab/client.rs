//! Trafiklab realtime + ResRobot HTTP client.
//!
//! Two upstream services share one client: the Trafiklab realtime API
//! (departures, arrivals, stop lookup; key sent as a `key` query
//! parameter) and the ResRobot travel planner (trip search; key sent as
//! `accessId`). All operations return the raw JSON payload; response
//! shapes vary across upstream revisions, so interpretation is left to
//! the normalization layer.

use serde_json::Value;

use super::error::TrafiklabError;

/// Default base URL for the Trafiklab realtime API.
const DEFAULT_BASE_URL: &str = "https://realtime-api.trafiklab.se/v1";

/// Default base URL for the ResRobot travel planner.
const DEFAULT_RESROBOT_BASE_URL: &str = "https://api.resrobot.se/v2.1";

/// Stop id used for key validation probes (Stockholm Centralstation).
const VALIDATION_STOP_ID: &str = "740098000";

/// Upper bound accepted for `max_walking_distance`, in meters.
const MAX_WALKING_DISTANCE: u32 = 10_000;

/// Default walking distance for trip search, in meters.
const DEFAULT_WALKING_DISTANCE: u32 = 1_000;

/// An origin or destination for trip search.
#[derive(Debug, Clone, PartialEq)]
pub enum Place {
    /// A stable stop/area id.
    StopId(String),
    /// A WGS84 coordinate pair, kept as strings the way the upstream
    /// expects them.
    Coordinates { lat: String, lon: String },
}

/// Failed to parse a place from its configured kind and value.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid place: {0}")]
pub struct PlaceParseError(String);

impl Place {
    /// Parse from the configured `(kind, value)` pair.
    ///
    /// `kind` is `"stop_id"` or `"coordinates"`; coordinates are a
    /// `"lat,lon"` string, whitespace-tolerant.
    pub fn parse(kind: &str, value: &str) -> Result<Self, PlaceParseError> {
        match kind {
            "stop_id" => {
                let id = value.trim();
                if id.is_empty() {
                    return Err(PlaceParseError("empty stop id".into()));
                }
                Ok(Place::StopId(id.to_string()))
            }
            "coordinates" => {
                let (lat, lon) = value
                    .split_once(',')
                    .ok_or_else(|| PlaceParseError(format!("not a lat,lon pair: {value}")))?;
                let (lat, lon) = (lat.trim(), lon.trim());
                if lat.is_empty() || lon.is_empty() {
                    return Err(PlaceParseError(format!("not a lat,lon pair: {value}")));
                }
                Ok(Place::Coordinates {
                    lat: lat.to_string(),
                    lon: lon.to_string(),
                })
            }
            other => Err(PlaceParseError(format!("unknown place kind: {other}"))),
        }
    }
}

/// Parameters for a trip search.
#[derive(Debug, Clone, PartialEq)]
pub struct TripQuery {
    pub origin: Place,
    pub destination: Place,
    /// Stop id the trip must pass through (empty = unset).
    pub via: String,
    /// Stop id the trip must avoid (empty = unset).
    pub avoid: String,
    /// Maximum walking distance at either end, in meters.
    pub max_walking_distance: u32,
}

impl TripQuery {
    /// Create a query between two places with default options.
    pub fn new(origin: Place, destination: Place) -> Self {
        Self {
            origin,
            destination,
            via: String::new(),
            avoid: String::new(),
            max_walking_distance: DEFAULT_WALKING_DISTANCE,
        }
    }

    /// Require the trip to pass through a stop.
    pub fn with_via(mut self, via: impl Into<String>) -> Self {
        self.via = via.into();
        self
    }

    /// Require the trip to avoid a stop.
    pub fn with_avoid(mut self, avoid: impl Into<String>) -> Self {
        self.avoid = avoid.into();
        self
    }

    /// Set the walking distance bound (clamped to 0–10000 m).
    pub fn with_max_walking_distance(mut self, meters: u32) -> Self {
        self.max_walking_distance = meters.min(MAX_WALKING_DISTANCE);
        self
    }
}

/// Configuration for the Trafiklab client.
#[derive(Debug, Clone)]
pub struct TrafiklabConfig {
    /// API key for both upstream services
    pub api_key: String,
    /// Base URL for the realtime API (defaults to production)
    pub base_url: String,
    /// Base URL for the ResRobot travel planner (defaults to production)
    pub resrobot_base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl TrafiklabConfig {
    /// Create a new config with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            resrobot_base_url: DEFAULT_RESROBOT_BASE_URL.to_string(),
            timeout_secs: 15,
        }
    }

    /// Set a custom realtime base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set a custom ResRobot base URL (for testing).
    pub fn with_resrobot_base_url(mut self, url: impl Into<String>) -> Self {
        self.resrobot_base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// The transport seam consumed by the refresh engine and stop directory.
///
/// This abstraction allows both to be tested without network access.
#[async_trait::async_trait]
pub trait TransitApi: Send + Sync {
    /// Raw departures payload for a stop/area id.
    async fn departures(&self, stop_id: &str) -> Result<Value, TrafiklabError>;

    /// Raw arrivals payload for a stop/area id.
    async fn arrivals(&self, stop_id: &str) -> Result<Value, TrafiklabError>;

    /// Raw trip-search payload for an origin/destination query.
    async fn trip_search(&self, query: &TripQuery) -> Result<Value, TrafiklabError>;

    /// Raw stop-lookup payload for a free-text query.
    async fn stop_lookup(&self, query: &str) -> Result<Value, TrafiklabError>;
}

/// HTTP client for the Trafiklab and ResRobot APIs.
///
/// Operations never retry; retry policy belongs to the caller. Timeouts
/// are enforced by the underlying `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct TrafiklabClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    resrobot_base_url: String,
}

impl TrafiklabClient {
    /// Create a new client with its own connection pool.
    pub fn new(config: TrafiklabConfig) -> Result<Self, TrafiklabError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self::with_http_client(http, config))
    }

    /// Create a client over an externally supplied `reqwest::Client`.
    ///
    /// The connection pool may be shared with the host; this client never
    /// assumes exclusive ownership of it. The config's `timeout_secs` is
    /// ignored here, the supplied client's timeout applies.
    pub fn with_http_client(http: reqwest::Client, config: TrafiklabConfig) -> Self {
        Self {
            http,
            api_key: config.api_key,
            base_url: config.base_url,
            resrobot_base_url: config.resrobot_base_url,
        }
    }

    /// Get the raw departures payload for a stop/area id.
    pub async fn get_departures(&self, stop_id: &str) -> Result<Value, TrafiklabError> {
        let url = format!("{}/departures/{}", self.base_url, stop_id);
        self.get_json(&url, &[("key", self.api_key.clone())], stop_id)
            .await
    }

    /// Get the raw arrivals payload for a stop/area id.
    pub async fn get_arrivals(&self, stop_id: &str) -> Result<Value, TrafiklabError> {
        let url = format!("{}/arrivals/{}", self.base_url, stop_id);
        self.get_json(&url, &[("key", self.api_key.clone())], stop_id)
            .await
    }

    /// Search for stops by free-text name.
    pub async fn search_stops(&self, query: &str) -> Result<Value, TrafiklabError> {
        let url = format!("{}/stops/name/{}", self.base_url, query);
        self.get_json(&url, &[("key", self.api_key.clone())], query)
            .await
    }

    /// Run a ResRobot trip search.
    pub async fn search_trips(&self, query: &TripQuery) -> Result<Value, TrafiklabError> {
        let url = format!("{}/trip", self.resrobot_base_url);
        let params = trip_params(&self.api_key, query);
        self.get_json(&url, &params, "trip search").await
    }

    /// Validate the configured key with a probe request.
    ///
    /// Never raises: any failure means "not valid".
    pub async fn validate_key(&self) -> bool {
        self.get_departures(VALIDATION_STOP_ID).await.is_ok()
    }

    async fn get_json(
        &self,
        url: &str,
        params: &[(&str, String)],
        context: &str,
    ) -> Result<Value, TrafiklabError> {
        let response = self.http.get(url).query(params).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(TrafiklabError::Unauthorized);
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(TrafiklabError::StopNotFound(context.to_string()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TrafiklabError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| TrafiklabError::Json {
            message: e.to_string(),
        })
    }
}

/// Build the ResRobot trip-search query string.
fn trip_params(api_key: &str, query: &TripQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("accessId", api_key.to_string()),
        ("format", "json".to_string()),
    ];

    match &query.origin {
        Place::StopId(id) => params.push(("originId", id.clone())),
        Place::Coordinates { lat, lon } => {
            params.push(("originCoordLat", lat.clone()));
            params.push(("originCoordLong", lon.clone()));
        }
    }

    match &query.destination {
        Place::StopId(id) => params.push(("destId", id.clone())),
        Place::Coordinates { lat, lon } => {
            params.push(("destCoordLat", lat.clone()));
            params.push(("destCoordLong", lon.clone()));
        }
    }

    if !query.via.is_empty() {
        params.push(("viaId", query.via.clone()));
    }
    if !query.avoid.is_empty() {
        params.push(("avoidId", query.avoid.clone()));
    }

    // allowWalk, minDistance, maxDistance, percent
    let walk = format!("1,0,{},75", query.max_walking_distance);
    params.push(("originWalk", walk.clone()));
    params.push(("destWalk", walk));

    params
}

#[async_trait::async_trait]
impl TransitApi for TrafiklabClient {
    async fn departures(&self, stop_id: &str) -> Result<Value, TrafiklabError> {
        self.get_departures(stop_id).await
    }

    async fn arrivals(&self, stop_id: &str) -> Result<Value, TrafiklabError> {
        self.get_arrivals(stop_id).await
    }

    async fn trip_search(&self, query: &TripQuery) -> Result<Value, TrafiklabError> {
        self.search_trips(query).await
    }

    async fn stop_lookup(&self, query: &str) -> Result<Value, TrafiklabError> {
        self.search_stops(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = TrafiklabConfig::new("test-key")
            .with_base_url("http://localhost:8080")
            .with_resrobot_base_url("http://localhost:8081")
            .with_timeout(60);

        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.resrobot_base_url, "http://localhost:8081");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn config_defaults() {
        let config = TrafiklabConfig::new("test-key");

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.resrobot_base_url, DEFAULT_RESROBOT_BASE_URL);
        assert_eq!(config.timeout_secs, 15);
    }

    #[test]
    fn client_creation() {
        let config = TrafiklabConfig::new("test-key");
        let client = TrafiklabClient::new(config);
        assert!(client.is_ok());
    }

    #[test]
    fn place_parse_stop_id() {
        let place = Place::parse("stop_id", " 740000001 ").unwrap();
        assert_eq!(place, Place::StopId("740000001".to_string()));

        assert!(Place::parse("stop_id", "  ").is_err());
    }

    #[test]
    fn place_parse_coordinates() {
        let place = Place::parse("coordinates", "59.3293, 18.0686").unwrap();
        assert_eq!(
            place,
            Place::Coordinates {
                lat: "59.3293".to_string(),
                lon: "18.0686".to_string(),
            }
        );

        assert!(Place::parse("coordinates", "59.3293").is_err());
        assert!(Place::parse("latlon", "59.3293,18.0686").is_err());
    }

    #[test]
    fn trip_params_stop_ids() {
        let query = TripQuery::new(
            Place::StopId("740000001".into()),
            Place::StopId("740000002".into()),
        )
        .with_via("740000003");

        let params = trip_params("k", &query);

        assert!(params.contains(&("originId", "740000001".to_string())));
        assert!(params.contains(&("destId", "740000002".to_string())));
        assert!(params.contains(&("viaId", "740000003".to_string())));
        assert!(params.contains(&("originWalk", "1,0,1000,75".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "avoidId"));
    }

    #[test]
    fn trip_params_coordinates() {
        let query = TripQuery::new(
            Place::Coordinates {
                lat: "59.3293".into(),
                lon: "18.0686".into(),
            },
            Place::StopId("740000002".into()),
        );

        let params = trip_params("k", &query);

        assert!(params.contains(&("originCoordLat", "59.3293".to_string())));
        assert!(params.contains(&("originCoordLong", "18.0686".to_string())));
        assert!(params.contains(&("destId", "740000002".to_string())));
    }

    #[test]
    fn walking_distance_is_clamped() {
        let query = TripQuery::new(
            Place::StopId("1".into()),
            Place::StopId("2".into()),
        )
        .with_max_walking_distance(50_000);

        assert_eq!(query.max_walking_distance, MAX_WALKING_DISTANCE);
    }
}
