//! Mock transit API for testing without network access.
//!
//! Serves scripted payloads or failures per operation and counts calls,
//! so tests can assert that (for example) a gated refresh cycle made
//! zero requests.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use super::client::{TransitApi, TripQuery};
use super::error::TrafiklabError;

/// Which client operation a scripted response applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Departures,
    Arrivals,
    TripSearch,
    StopLookup,
}

/// A scripted failure. Cloneable so one script can serve many calls.
#[derive(Debug, Clone)]
pub enum MockFailure {
    Unauthorized,
    NotFound,
    Timeout,
    Api(u16),
}

impl MockFailure {
    fn into_error(self, context: &str) -> TrafiklabError {
        match self {
            MockFailure::Unauthorized => TrafiklabError::Unauthorized,
            MockFailure::NotFound => TrafiklabError::StopNotFound(context.to_string()),
            MockFailure::Timeout => TrafiklabError::Timeout,
            MockFailure::Api(status) => TrafiklabError::Api {
                status,
                message: "mock failure".to_string(),
            },
        }
    }
}

/// Scripted `TransitApi` implementation.
#[derive(Default)]
pub struct MockTransitApi {
    responses: Mutex<HashMap<Op, Result<Value, MockFailure>>>,
    calls: Mutex<HashMap<Op, usize>>,
}

impl MockTransitApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a successful payload for an operation.
    pub fn respond(&self, op: Op, payload: Value) {
        self.lock_responses().insert(op, Ok(payload));
    }

    /// Script a failure for an operation.
    pub fn fail(&self, op: Op, failure: MockFailure) {
        self.lock_responses().insert(op, Err(failure));
    }

    /// How many times an operation has been called.
    pub fn calls(&self, op: Op) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&op)
            .copied()
            .unwrap_or(0)
    }

    fn lock_responses(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<Op, Result<Value, MockFailure>>> {
        self.responses.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn serve(&self, op: Op, context: &str) -> Result<Value, TrafiklabError> {
        *self
            .calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(op)
            .or_insert(0) += 1;

        match self.lock_responses().get(&op) {
            Some(Ok(payload)) => Ok(payload.clone()),
            Some(Err(failure)) => Err(failure.clone().into_error(context)),
            None => Err(TrafiklabError::Api {
                status: 0,
                message: format!("no mock response scripted for {op:?}"),
            }),
        }
    }
}

#[async_trait::async_trait]
impl TransitApi for MockTransitApi {
    async fn departures(&self, stop_id: &str) -> Result<Value, TrafiklabError> {
        self.serve(Op::Departures, stop_id)
    }

    async fn arrivals(&self, stop_id: &str) -> Result<Value, TrafiklabError> {
        self.serve(Op::Arrivals, stop_id)
    }

    async fn trip_search(&self, _query: &TripQuery) -> Result<Value, TrafiklabError> {
        self.serve(Op::TripSearch, "trip search")
    }

    async fn stop_lookup(&self, query: &str) -> Result<Value, TrafiklabError> {
        self.serve(Op::StopLookup, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn serves_scripted_payloads_and_counts_calls() {
        let mock = MockTransitApi::new();
        mock.respond(Op::Departures, json!({"departures": []}));

        let payload = mock.departures("740098000").await.unwrap();
        assert_eq!(payload, json!({"departures": []}));
        assert_eq!(mock.calls(Op::Departures), 1);
        assert_eq!(mock.calls(Op::Arrivals), 0);
    }

    #[tokio::test]
    async fn serves_scripted_failures() {
        let mock = MockTransitApi::new();
        mock.fail(Op::Departures, MockFailure::NotFound);

        let err = mock.departures("999").await.unwrap_err();
        assert!(matches!(err, TrafiklabError::StopNotFound(id) if id == "999"));
    }

    #[tokio::test]
    async fn unscripted_operation_is_an_error() {
        let mock = MockTransitApi::new();
        assert!(mock.arrivals("740098000").await.is_err());
        assert_eq!(mock.calls(Op::Arrivals), 1);
    }
}
