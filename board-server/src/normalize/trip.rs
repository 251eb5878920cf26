//! Trip-search response normalization.
//!
//! ResRobot serializes XML-ish structures to JSON: a field that holds a
//! list becomes a bare object when there is exactly one element, and is
//! omitted entirely when empty. Both `Trip` and `LegList.Leg` suffer
//! from this. Normalization produces a canonical shape (always lists)
//! and a deterministic ordering, and never fails: unparsable timestamps
//! sort last via a sentinel.

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{Map, Value};

use super::duration::parse_duration_minutes;

const LEG_TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Sentinel for unparsable origins: sorts after every real timestamp.
const SENTINEL: NaiveDateTime = NaiveDateTime::MAX;

/// Parse a `"YYYY-MM-DD HH:MM[:SS]"` leg timestamp.
pub fn parse_leg_datetime(input: &str) -> Option<NaiveDateTime> {
    LEG_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input.trim(), fmt).ok())
}

/// Absent/null becomes empty, a bare object becomes a one-element list.
fn coerce_to_list(value: Option<Value>) -> Vec<Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => vec![other],
    }
}

/// Parsed instant of an `Origin`/`Destination` point (`date` + `time`).
fn parse_point_datetime(point: &Value) -> NaiveDateTime {
    let date = point.get("date").and_then(Value::as_str).unwrap_or("");
    let time = point.get("time").and_then(Value::as_str).unwrap_or("");
    parse_leg_datetime(&format!("{date} {time}")).unwrap_or(SENTINEL)
}

fn leg_origin_datetime(leg: &Value) -> NaiveDateTime {
    leg.get("Origin").map(parse_point_datetime).unwrap_or(SENTINEL)
}

/// Normalize a raw trip-search payload.
///
/// Afterwards `Trip` is always a list, every trip's `LegList.Leg` is a
/// list, legs are sorted ascending by parsed origin time (upstream index
/// breaks ties), and trips are sorted by their first leg's origin (or
/// the trip-level `Origin` when a trip has no legs). Idempotent: a
/// normalized payload normalizes to itself.
pub fn normalize_trip_payload(payload: Value) -> Value {
    let mut root = match payload {
        Value::Object(map) => map,
        other => return other,
    };

    let trips = coerce_to_list(root.remove("Trip"));

    let mut keyed: Vec<(NaiveDateTime, Value)> = trips
        .into_iter()
        .map(|trip| {
            let trip = normalize_trip(trip);
            (trip_sort_key(&trip), trip)
        })
        .collect();
    // stable: equal keys keep upstream order
    keyed.sort_by_key(|(key, _)| *key);

    root.insert(
        "Trip".to_string(),
        Value::Array(keyed.into_iter().map(|(_, trip)| trip).collect()),
    );
    Value::Object(root)
}

fn normalize_trip(trip: Value) -> Value {
    let mut trip = match trip {
        Value::Object(map) => map,
        other => return other,
    };

    let mut leg_list = match trip.remove("LegList") {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };

    let legs = coerce_to_list(leg_list.remove("Leg"));

    let mut keyed: Vec<(NaiveDateTime, usize, Value)> = legs
        .into_iter()
        .enumerate()
        .map(|(index, leg)| (leg_origin_datetime(&leg), index, leg))
        .collect();
    keyed.sort_by_key(|(origin, index, _)| (*origin, *index));

    leg_list.insert(
        "Leg".to_string(),
        Value::Array(keyed.into_iter().map(|(_, _, leg)| leg).collect()),
    );
    trip.insert("LegList".to_string(), Value::Object(leg_list));
    Value::Object(trip)
}

fn trip_sort_key(trip: &Value) -> NaiveDateTime {
    let first_leg = trip
        .get("LegList")
        .and_then(|list| list.get("Leg"))
        .and_then(Value::as_array)
        .and_then(|legs| legs.first());

    match first_leg {
        Some(leg) => leg_origin_datetime(leg),
        None => trip
            .get("Origin")
            .map(parse_point_datetime)
            .unwrap_or(SENTINEL),
    }
}

/// One directly-connected segment of a trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leg {
    pub origin_name: String,
    /// `"YYYY-MM-DD HH:MM[:SS]"`, as served upstream.
    pub origin_time: String,
    pub dest_name: String,
    pub dest_time: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub product: String,
    pub direction: String,
    pub distance_meters: i64,
    pub line_number: String,
    pub duration_minutes: Option<i64>,
    /// Translated category label.
    pub category: String,
}

/// One complete journey option: an ordered sequence of legs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trip {
    pub legs: Vec<Leg>,
    pub duration_minutes: Option<i64>,
}

/// Project a normalized trip payload into typed trips.
pub fn project_trips(payload: &Value) -> Vec<Trip> {
    let Some(trips) = payload.get("Trip").and_then(Value::as_array) else {
        return Vec::new();
    };
    trips.iter().map(project_trip).collect()
}

fn project_trip(trip: &Value) -> Trip {
    let legs = trip
        .get("LegList")
        .and_then(|list| list.get("Leg"))
        .and_then(Value::as_array)
        .map(|legs| legs.iter().map(project_leg).collect())
        .unwrap_or_default();

    Trip {
        legs,
        duration_minutes: trip
            .get("duration")
            .and_then(Value::as_str)
            .and_then(parse_duration_minutes),
    }
}

fn point_name(point: Option<&Value>) -> String {
    point
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

fn point_time(point: Option<&Value>) -> String {
    let Some(point) = point else {
        return String::new();
    };
    let date = point.get("date").and_then(Value::as_str).unwrap_or("");
    let time = point.get("time").and_then(Value::as_str).unwrap_or("");
    format!("{date} {time}").trim().to_string()
}

/// `Product` is sometimes a bare object and sometimes a one-element
/// list; take the first either way.
fn product_object(leg: &Value) -> Option<&Value> {
    match leg.get("Product") {
        Some(Value::Array(products)) => products.first(),
        other => other,
    }
}

fn project_leg(leg: &Value) -> Leg {
    let product = product_object(leg);
    let product_str = |key: &str| -> String {
        product
            .and_then(|p| p.get(key))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    };

    let line_number = {
        let num = product_str("num");
        if num.is_empty() {
            product_str("displayNumber")
        } else {
            num
        }
    };

    Leg {
        origin_name: point_name(leg.get("Origin")),
        origin_time: point_time(leg.get("Origin")),
        dest_name: point_name(leg.get("Destination")),
        dest_time: point_time(leg.get("Destination")),
        kind: leg
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        product: product_str("name"),
        direction: leg
            .get("direction")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        distance_meters: leg.get("dist").and_then(Value::as_i64).unwrap_or(0),
        line_number,
        duration_minutes: leg
            .get("duration")
            .and_then(Value::as_str)
            .and_then(parse_duration_minutes),
        category: category_label(product),
    }
}

/// Category label for a leg's product.
///
/// Prefers the upstream long label (`catOutL`) over the fixed
/// abbreviation table; unknown abbreviations pass through unchanged.
fn category_label(product: Option<&Value>) -> String {
    let Some(product) = product else {
        return String::new();
    };

    if let Some(long) = product.get("catOutL").and_then(Value::as_str)
        && !long.is_empty()
    {
        return long.to_string();
    }

    let code = product
        .get("catOut")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim();

    match code {
        "BLT" => "Bus",
        "BXB" => "Express bus",
        "BAX" => "Airport bus",
        "JLT" => "Local train",
        "JRE" => "Regional train",
        "JIC" => "InterCity train",
        "JPT" => "Express train",
        "JST" => "High-speed train",
        "JAX" => "Airport train",
        "SLT" => "Tram",
        "ULT" => "Metro",
        "FLT" => "Ferry",
        "FUT" => "International ferry",
        other => other,
    }
    .to_string()
}
