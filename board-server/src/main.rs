use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use board_server::display::Locale;
use board_server::engine::{RefreshEngine, SourceConfig};
use board_server::stops::{StopCacheConfig, StopDirectory};
use board_server::trafiklab::{Place, TrafiklabClient, TrafiklabConfig, TripQuery};
use board_server::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let api_key = std::env::var("TRAFIKLAB_API_KEY").unwrap_or_else(|_| {
        warn!("TRAFIKLAB_API_KEY not set; API calls will fail");
        String::new()
    });

    let client = TrafiklabClient::new(TrafiklabConfig::new(&api_key))
        .expect("failed to create Trafiklab client");
    let api: Arc<dyn board_server::trafiklab::TransitApi> = Arc::new(client);

    let config = source_config_from_env();
    info!(config = ?config, "starting refresh engine");
    let engine = RefreshEngine::new(api.clone(), config);
    engine.start();

    let stops = Arc::new(StopDirectory::new(api, StopCacheConfig::default()));

    let default_locale = std::env::var("BOARD_LOCALE")
        .ok()
        .and_then(|tag| Locale::parse(&tag))
        .unwrap_or_default();

    let state = AppState {
        engine,
        stops,
        default_locale,
    };
    let app = create_router(state);

    let addr: SocketAddr = std::env::var("BOARD_ADDR")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000)));
    info!("departure board listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app).await.expect("server failed");
}

/// Assemble the source configuration from `BOARD_*` environment
/// variables. Missing or malformed values fall back to defaults with a
/// warning rather than aborting startup.
fn source_config_from_env() -> SourceConfig {
    let mode = std::env::var("BOARD_MODE").unwrap_or_else(|_| "departures".to_string());
    let mut config = match mode.trim().to_lowercase().as_str() {
        "arrivals" => SourceConfig::arrivals(stop_id_from_env()),
        "trip" | "trips" | "trip_search" => match trip_query_from_env() {
            Some(query) => SourceConfig::trip_search(query),
            None => {
                warn!("BOARD_MODE=trips but origin/destination missing; using departures");
                SourceConfig::departures(stop_id_from_env())
            }
        },
        "departures" => SourceConfig::departures(stop_id_from_env()),
        other => {
            warn!(mode = other, "unknown BOARD_MODE; using departures");
            SourceConfig::departures(stop_id_from_env())
        }
    };

    if let Ok(lines) = std::env::var("BOARD_LINE_FILTER") {
        config = config.with_line_filter_str(&lines);
    }
    if let Ok(needles) = std::env::var("BOARD_DESTINATION_FILTER") {
        config = config.with_destination_filter_str(&needles);
    }
    if let Some(mins) = env_u32("BOARD_TIME_WINDOW") {
        config = config.with_time_window_mins(mins);
    }
    if let Some(secs) = env_u32("BOARD_REFRESH_INTERVAL") {
        config = config.with_refresh_interval(Duration::from_secs(u64::from(secs)));
    }
    if let Ok(expr) = std::env::var("BOARD_UPDATE_CONDITION") {
        config = config.with_update_condition_str(&expr);
    }
    config
}

fn stop_id_from_env() -> String {
    std::env::var("BOARD_STOP_ID").unwrap_or_else(|_| {
        warn!("BOARD_STOP_ID not set; using Stockholm Central");
        "740098000".to_string()
    })
}

fn trip_query_from_env() -> Option<TripQuery> {
    let origin = place_from_env("BOARD_ORIGIN", "BOARD_ORIGIN_TYPE")?;
    let destination = place_from_env("BOARD_DESTINATION", "BOARD_DESTINATION_TYPE")?;

    let mut query = TripQuery::new(origin, destination);
    if let Ok(via) = std::env::var("BOARD_VIA") {
        query = query.with_via(&via);
    }
    if let Ok(avoid) = std::env::var("BOARD_AVOID") {
        query = query.with_avoid(&avoid);
    }
    if let Some(distance) = env_u32("BOARD_MAX_WALK") {
        query = query.with_max_walking_distance(distance);
    }
    Some(query)
}

fn place_from_env(value_var: &str, kind_var: &str) -> Option<Place> {
    let value = std::env::var(value_var).ok()?;
    let kind = std::env::var(kind_var).unwrap_or_else(|_| "stop_id".to_string());
    match Place::parse(&kind, &value) {
        Ok(place) => Some(place),
        Err(err) => {
            warn!(var = value_var, error = %err, "ignoring malformed place");
            None
        }
    }
}

fn env_u32(var: &str) -> Option<u32> {
    let raw = std::env::var(var).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var, raw, "ignoring non-numeric value");
            None
        }
    }
}
