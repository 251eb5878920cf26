//! Departure board server for Swedish public transport.
//!
//! Polls the Trafiklab realtime API (departures/arrivals) or the
//! ResRobot trip planner on an interval, normalizes the varied payload
//! shapes into canonical types, and serves the result over HTTP with
//! countdown-style display projections.

pub mod display;
pub mod engine;
pub mod normalize;
pub mod stops;
pub mod trafiklab;
pub mod web;
