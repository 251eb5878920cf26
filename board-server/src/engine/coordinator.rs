//! The refresh engine: a single sequential loop that periodically
//! fetches from the transit API, normalizes the payload, and publishes
//! an immutable snapshot.

use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{RwLock, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::normalize::{normalize_trip_payload, project_batch, project_trips, sort_items};
use crate::trafiklab::{TrafiklabError, TransitApi};

use super::condition::coerce_to_bool;
use super::config::{FetchMode, SourceConfig};
use super::snapshot::{Snapshot, SnapshotData};

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Api(#[from] TrafiklabError),
    #[error("invalid response: {0}")]
    Validation(String),
}

/// Where the engine currently is in its cycle.
///
/// `Published` and `Failed` are resting phases: they persist until the
/// next fetch begins, so a status probe between cycles reports how the
/// most recent cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnginePhase {
    Idle,
    Fetching,
    Published,
    Failed,
}

enum Command {
    /// Run a refresh out of schedule; the sender (if any) is notified
    /// once the cycle has completed.
    Refresh(Option<oneshot::Sender<()>>),
    /// The configuration was swapped; re-arm the interval timer.
    ConfigChanged,
    Shutdown,
}

struct Shared {
    snapshot: Option<Snapshot>,
    last_error: Option<String>,
    phase: EnginePhase,
}

struct EngineInner {
    api: Arc<dyn TransitApi>,
    config: RwLock<Arc<SourceConfig>>,
    shared: RwLock<Shared>,
    tx: mpsc::Sender<Command>,
    // Handed to the run loop on start; `None` afterwards.
    rx: StdMutex<Option<mpsc::Receiver<Command>>>,
}

/// Handle to the refresh loop for one source.
///
/// Cheap to clone; all clones share the same loop and snapshot.
#[derive(Clone)]
pub struct RefreshEngine {
    inner: Arc<EngineInner>,
}

impl RefreshEngine {
    pub fn new(api: Arc<dyn TransitApi>, config: SourceConfig) -> Self {
        let (tx, rx) = mpsc::channel(8);
        Self {
            inner: Arc::new(EngineInner {
                api,
                config: RwLock::new(Arc::new(config)),
                shared: RwLock::new(Shared {
                    snapshot: None,
                    last_error: None,
                    phase: EnginePhase::Idle,
                }),
                tx,
                rx: StdMutex::new(Some(rx)),
            }),
        }
    }

    /// Spawn the refresh loop. The first fetch runs immediately.
    pub fn start(&self) -> JoinHandle<()> {
        let rx = self
            .inner
            .rx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        let engine = self.clone();
        tokio::spawn(async move {
            match rx {
                Some(rx) => engine.run_loop(rx).await,
                None => warn!("refresh loop already started; ignoring"),
            }
        })
    }

    pub async fn snapshot(&self) -> Option<Snapshot> {
        self.inner.shared.read().await.snapshot.clone()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.inner.shared.read().await.last_error.clone()
    }

    pub async fn phase(&self) -> EnginePhase {
        self.inner.shared.read().await.phase
    }

    pub async fn last_successful_update(&self) -> Option<DateTime<Utc>> {
        self.inner
            .shared
            .read()
            .await
            .snapshot
            .as_ref()
            .map(|s| s.last_successful_update)
    }

    pub async fn config(&self) -> Arc<SourceConfig> {
        self.inner.config.read().await.clone()
    }

    /// Swap in a new configuration; it takes effect from the next cycle.
    pub async fn update_config(&self, config: SourceConfig) {
        *self.inner.config.write().await = Arc::new(config);
        let _ = self.inner.tx.send(Command::ConfigChanged).await;
    }

    /// Queue an out-of-schedule refresh. If a fetch is already in
    /// flight the request waits its turn; fetches never overlap.
    pub async fn refresh_now(&self) {
        let _ = self.inner.tx.send(Command::Refresh(None)).await;
    }

    /// Queue a refresh and wait for the cycle to finish.
    pub async fn refresh_now_and_wait(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self
            .inner
            .tx
            .send(Command::Refresh(Some(done_tx)))
            .await
            .is_ok()
        {
            let _ = done_rx.await;
        }
    }

    pub async fn shutdown(&self) {
        let _ = self.inner.tx.send(Command::Shutdown).await;
    }

    async fn run_loop(self, mut rx: mpsc::Receiver<Command>) {
        let mut interval = self.make_interval().await;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.run_cycle(true).await;
                }
                command = rx.recv() => {
                    match command {
                        Some(Command::Refresh(done)) => {
                            self.run_cycle(false).await;
                            if let Some(done) = done {
                                let _ = done.send(());
                            }
                        }
                        Some(Command::ConfigChanged) => {
                            // New interval fires immediately, which
                            // doubles as a fetch under the new config.
                            interval = self.make_interval().await;
                        }
                        Some(Command::Shutdown) | None => {
                            info!("refresh loop shutting down");
                            return;
                        }
                    }
                }
            }
        }
    }

    async fn make_interval(&self) -> tokio::time::Interval {
        let period = self.inner.config.read().await.refresh_interval;
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        interval
    }

    /// One refresh cycle. Scheduled cycles are gated by the update
    /// condition; an evaluation error fails open so a broken condition
    /// never starves the board of data.
    pub(crate) async fn run_cycle(&self, scheduled: bool) {
        let config = self.config().await;

        if scheduled && let Some(condition) = &config.update_condition {
            match condition.evaluate() {
                Ok(value) => {
                    if !coerce_to_bool(&value) {
                        debug!("update condition is false; skipping refresh");
                        return;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "update condition failed; refreshing anyway");
                }
            }
        }

        self.inner.shared.write().await.phase = EnginePhase::Fetching;

        match self.fetch_snapshot(&config).await {
            Ok(data) => {
                let snapshot = Snapshot::published_now(data);
                let mut shared = self.inner.shared.write().await;
                shared.snapshot = Some(snapshot);
                shared.last_error = None;
                shared.phase = EnginePhase::Published;
                info!(mode = ?config.mode, "published fresh snapshot");
            }
            Err(err) => {
                let mut shared = self.inner.shared.write().await;
                shared.last_error = Some(err.to_string());
                shared.phase = EnginePhase::Failed;
                warn!(error = %err, "refresh failed; keeping previous snapshot");
            }
        }
    }

    async fn fetch_snapshot(&self, config: &SourceConfig) -> Result<SnapshotData, RefreshError> {
        match config.mode {
            FetchMode::Departures => {
                let payload = self.inner.api.departures(&config.stop_id).await?;
                build_board(&payload, "departures")
            }
            FetchMode::Arrivals => {
                let payload = self.inner.api.arrivals(&config.stop_id).await?;
                build_board(&payload, "arrivals")
            }
            FetchMode::TripSearch => {
                let query = config.trip.as_ref().ok_or_else(|| {
                    RefreshError::Validation("trip search mode without a trip query".to_string())
                })?;
                let payload = self.inner.api.trip_search(query).await?;
                build_trips(payload)
            }
        }
    }
}

/// Validate a realtime board payload and project it into sorted
/// canonical items.
fn build_board(payload: &Value, list_key: &str) -> Result<SnapshotData, RefreshError> {
    let object = payload
        .as_object()
        .ok_or_else(|| RefreshError::Validation("payload is not an object".to_string()))?;

    for key in ["timestamp", "query", "stops"] {
        if !object.contains_key(key) {
            return Err(RefreshError::Validation(format!("missing key `{key}`")));
        }
    }

    // The list lives at the top level, or inside the first stop on
    // older payload shapes.
    let raw_items = object
        .get(list_key)
        .and_then(Value::as_array)
        .or_else(|| {
            object
                .get("stops")?
                .as_array()?
                .first()?
                .get(list_key)?
                .as_array()
        })
        .ok_or_else(|| RefreshError::Validation(format!("missing key `{list_key}`")))?;

    let stop_name = object
        .get("stops")
        .and_then(Value::as_array)
        .and_then(|stops| stops.first())
        .and_then(|stop| stop.get("name"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut items = project_batch(raw_items);
    sort_items(&mut items);
    Ok(SnapshotData::Board { stop_name, items })
}

/// Normalize a trip-search payload and project it into typed trips.
fn build_trips(payload: Value) -> Result<SnapshotData, RefreshError> {
    if !payload.is_object() {
        return Err(RefreshError::Validation(
            "payload is not an object".to_string(),
        ));
    }
    let normalized = normalize_trip_payload(payload);
    let trips = project_trips(&normalized);
    Ok(SnapshotData::Trips { trips })
}
