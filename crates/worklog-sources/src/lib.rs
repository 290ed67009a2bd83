//! Data source adapters and the aggregator.
//!
//! Each adapter exposes `async fn fetch(config, start, end) ->
//! Result<Vec<WorkRecord>>` plus a cheap `test_connection` used by the
//! setup wizard. The aggregator runs the requested adapters serially and
//! keeps per-source failures from taking down the rest.

pub mod aggregate;
pub mod browser;
pub mod calendar;
pub mod github;
pub mod linear;
pub mod slack;

pub use aggregate::{fetch_range, DayData};
pub use linear::LinearClient;
