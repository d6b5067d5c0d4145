//! idler-query — invocation-rate lookups against a Prometheus-compatible
//! query backend.
//!
//! # Architecture
//!
//! ```text
//! MetricsAggregator
//!   ├── invocation_rate_query(name, window) → PromQL
//!   ├── QueryBackend::fetch(escaped)       → Vec<QuerySample>
//!   └── sum_series()                       → Option<f64> per function
//! ```
//!
//! A function with no series, or only unparsable values, is left out of
//! the resulting map. Absence means "no data" and is never treated as a
//! zero rate.

pub mod aggregator;
pub mod client;
pub mod error;

pub use aggregator::{
    INVOCATION_METRIC, MetricsAggregator, escape_query, invocation_rate_query, sum_series,
};
pub use client::{QueryBackend, QueryClient, QuerySample};
pub use error::QueryError;
