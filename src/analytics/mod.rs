//! Derived views over an already filtered batch of telemetry.

pub mod distribution;
pub mod n_plus_one;
pub mod percentile;
pub mod queries;
pub mod summary;
pub mod top_views;
pub mod types;
