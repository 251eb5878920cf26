//! Departure/arrival item projection.
//!
//! The realtime API has served several response revisions with different
//! field names (and nesting) for the same logical fields. Extraction is
//! table-driven: each logical field carries an ordered list of JSON
//! paths, and the first non-empty match wins.

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// One departure or arrival in canonical form.
///
/// Every string field defaults to the empty string rather than being
/// absent, so downstream code never branches on field presence. An empty
/// `expected_time` means "use the scheduled time".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalItem {
    pub line: String,
    pub destination: String,
    pub direction: String,
    pub scheduled_time: String,
    pub expected_time: String,
    pub transport_mode: String,
    pub is_realtime: bool,
    pub delay_seconds: i64,
    pub canceled: bool,
    pub platform: String,
    pub agency: String,
}

// Extraction rules, first-match-wins. The order is part of the contract:
// realtime-style names take precedence over the generic ones.
const LINE: &[&[&str]] = &[&["route", "designation"], &["line"]];
const DESTINATION: &[&[&str]] = &[&["route", "destination", "name"], &["destination"]];
const DIRECTION: &[&[&str]] = &[&["route", "direction"], &["direction"]];
const EXPECTED_TIME: &[&[&str]] = &[&["realtime"], &["expected_time"], &["time"]];
const SCHEDULED_TIME: &[&[&str]] = &[&["scheduled"], &["scheduled_time"], &["timetabled_time"]];
const TRANSPORT_MODE: &[&[&str]] = &[&["route", "transport_mode"], &["transport_mode"]];
const PLATFORM: &[&[&str]] = &[&["realtime_platform", "designation"], &["platform"]];
const AGENCY: &[&[&str]] = &[&["agency", "name"], &["operator"]];
const IS_REALTIME: &[&[&str]] = &[&["is_realtime"], &["real_time"]];
const DELAY: &[&[&str]] = &[&["delay"]];
const CANCELED: &[&[&str]] = &[&["canceled"]];

fn value_at<'a>(item: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = item;
    for key in path {
        current = current.get(key)?;
    }
    Some(current)
}

/// First non-empty string across the candidate paths.
fn first_string(item: &Value, paths: &[&[&str]]) -> String {
    paths
        .iter()
        .filter_map(|path| value_at(item, path))
        .filter_map(Value::as_str)
        .find(|s| !s.is_empty())
        .unwrap_or("")
        .to_string()
}

fn first_bool(item: &Value, paths: &[&[&str]]) -> bool {
    paths
        .iter()
        .filter_map(|path| value_at(item, path))
        .find_map(Value::as_bool)
        .unwrap_or(false)
}

fn first_i64(item: &Value, paths: &[&[&str]]) -> i64 {
    paths
        .iter()
        .filter_map(|path| value_at(item, path))
        .find_map(Value::as_i64)
        .unwrap_or(0)
}

/// Project one raw item into canonical form.
///
/// Returns `None` for items that are not JSON objects; every convertible
/// item succeeds, with missing fields defaulted.
pub fn project_item(item: &Value) -> Option<CanonicalItem> {
    if !item.is_object() {
        return None;
    }

    Some(CanonicalItem {
        line: first_string(item, LINE),
        destination: first_string(item, DESTINATION),
        direction: first_string(item, DIRECTION),
        scheduled_time: first_string(item, SCHEDULED_TIME),
        expected_time: first_string(item, EXPECTED_TIME),
        transport_mode: first_string(item, TRANSPORT_MODE).to_lowercase(),
        is_realtime: first_bool(item, IS_REALTIME),
        delay_seconds: first_i64(item, DELAY),
        canceled: first_bool(item, CANCELED),
        platform: first_string(item, PLATFORM),
        agency: first_string(item, AGENCY),
    })
}

/// Project a batch of raw items.
///
/// A malformed item is logged and skipped; it never aborts the batch.
pub fn project_batch(items: &[Value]) -> Vec<CanonicalItem> {
    items
        .iter()
        .filter_map(|raw| match project_item(raw) {
            Some(item) => Some(item),
            None => {
                warn!("skipping malformed board item: {raw}");
                None
            }
        })
        .collect()
}

/// Parse an ISO-8601 timestamp as served by the realtime API
/// (`2025-04-01T14:30:00`, optionally with a UTC offset).
pub fn parse_item_datetime(input: &str) -> Option<NaiveDateTime> {
    if input.is_empty() {
        return None;
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M"))
        .ok()
}

/// Sort items ascending by parsed scheduled time.
///
/// Unparsable timestamps sort last; the sort is stable so ties keep
/// upstream order.
pub fn sort_items(items: &mut [CanonicalItem]) {
    items.sort_by_key(|item| {
        parse_item_datetime(&item.scheduled_time).unwrap_or(NaiveDateTime::MAX)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_route_shape() {
        let item = json!({
            "route": {
                "designation": "4",
                "destination": {"name": "Radiohuset"},
                "direction": "Radiohuset",
                "transport_mode": "BUS",
            },
            "scheduled": "2025-04-01T14:30:00",
            "realtime": "2025-04-01T14:32:00",
            "is_realtime": true,
            "delay": 120,
            "agency": {"name": "SL"},
            "realtime_platform": {"designation": "B"},
        });

        let canonical = project_item(&item).unwrap();
        assert_eq!(canonical.line, "4");
        assert_eq!(canonical.destination, "Radiohuset");
        assert_eq!(canonical.scheduled_time, "2025-04-01T14:30:00");
        assert_eq!(canonical.expected_time, "2025-04-01T14:32:00");
        assert_eq!(canonical.transport_mode, "bus");
        assert!(canonical.is_realtime);
        assert_eq!(canonical.delay_seconds, 120);
        assert_eq!(canonical.platform, "B");
        assert_eq!(canonical.agency, "SL");
    }

    #[test]
    fn flattened_shape() {
        let item = json!({
            "line": "43X",
            "destination": "Centralen",
            "direction": "1",
            "timetabled_time": "2025-04-01T08:00:00",
            "time": "2025-04-01T08:01:00",
            "transport_mode": "TRAIN",
            "real_time": true,
            "platform": "2",
            "operator": "SJ",
        });

        let canonical = project_item(&item).unwrap();
        assert_eq!(canonical.line, "43X");
        assert_eq!(canonical.destination, "Centralen");
        assert_eq!(canonical.scheduled_time, "2025-04-01T08:00:00");
        assert_eq!(canonical.expected_time, "2025-04-01T08:01:00");
        assert!(canonical.is_realtime);
        assert_eq!(canonical.platform, "2");
        assert_eq!(canonical.agency, "SJ");
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let canonical = project_item(&json!({})).unwrap();
        assert_eq!(canonical.line, "");
        assert_eq!(canonical.destination, "");
        assert_eq!(canonical.scheduled_time, "");
        assert_eq!(canonical.expected_time, "");
        assert!(!canonical.is_realtime);
        assert!(!canonical.canceled);
        assert_eq!(canonical.delay_seconds, 0);
    }

    #[test]
    fn absent_realtime_leaves_expected_empty() {
        let item = json!({"scheduled": "2025-01-01T12:05:00"});

        let canonical = project_item(&item).unwrap();
        assert_eq!(canonical.expected_time, "");
        assert_eq!(canonical.scheduled_time, "2025-01-01T12:05:00");
    }

    #[test]
    fn realtime_takes_precedence_over_generic_time() {
        let item = json!({
            "realtime": "2025-01-01T12:07:00",
            "expected_time": "2025-01-01T12:06:00",
            "time": "2025-01-01T12:05:00",
        });

        let canonical = project_item(&item).unwrap();
        assert_eq!(canonical.expected_time, "2025-01-01T12:07:00");
    }

    #[test]
    fn non_object_items_are_skipped() {
        let items = vec![json!("not an object"), json!({"line": "4"}), json!(17)];
        let batch = project_batch(&items);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].line, "4");
    }

    #[test]
    fn sort_puts_unparsable_last() {
        let mut items = project_batch(&[
            json!({"line": "a", "scheduled": "garbage"}),
            json!({"line": "b", "scheduled": "2025-04-01T14:30:00"}),
            json!({"line": "c", "scheduled": "2025-04-01T14:00:00"}),
        ]);

        sort_items(&mut items);

        let lines: Vec<&str> = items.iter().map(|i| i.line.as_str()).collect();
        assert_eq!(lines, vec!["c", "b", "a"]);
    }

    #[test]
    fn parse_item_datetime_variants() {
        assert!(parse_item_datetime("2025-04-01T14:30:00").is_some());
        assert!(parse_item_datetime("2025-04-01T14:30").is_some());
        assert!(parse_item_datetime("2025-04-01T14:30:00+02:00").is_some());
        assert!(parse_item_datetime("").is_none());
        assert!(parse_item_datetime("14:30").is_none());
    }
}
