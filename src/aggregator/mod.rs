//! Stop and route reconciliation with per-vehicle arrival estimates.
//!
//! A stop forecast names the route variants serving the stop; each route
//! variant's telemetry lists its vehicles. The engine joins the two by
//! vehicle ID and derives distance plus speed-based arrival estimates.

pub mod engine;
pub mod geo;
pub mod types;
pub mod utility;
