//! Metrics aggregator — one invocation rate per function.
//!
//! Builds a per-function query summing the invocation counter rate across
//! response codes, runs it against a [`QueryBackend`], and reduces the
//! returned series to a single scalar.

use std::collections::HashMap;

use futures::stream::{self, StreamExt};
use idler_core::{Function, LookbackWindow};
use tracing::{debug, warn};

use crate::client::{QueryBackend, QuerySample};

/// Counter incremented by the gateway for every function invocation.
pub const INVOCATION_METRIC: &str = "gateway_function_invocation_total";

/// Label carrying the function name on invocation series.
const FUNCTION_LABEL: &str = "function_name";

/// PromQL for a function's invocation rate over `window`, per status code.
pub fn invocation_rate_query(function: &str, window: LookbackWindow) -> String {
    format!(
        r#"sum(rate({INVOCATION_METRIC}{{{FUNCTION_LABEL}="{}", code=~".*"}}[{window}])) by (code, {FUNCTION_LABEL})"#,
        escape_label_value(function)
    )
}

/// Escape a query for use as a URL query parameter value.
pub fn escape_query(query: &str) -> String {
    url::form_urlencoded::byte_serialize(query.as_bytes()).collect()
}

fn escape_label_value(value: &str) -> String {
    value.replace('\\', r"\\").replace('"', "\\\"")
}

/// Sum the values of all series belonging to `function`.
///
/// Returns `None` when no series matches, which callers must treat as
/// "no data" rather than a zero rate.
pub fn sum_series(function: &str, samples: &[QuerySample]) -> Option<f64> {
    samples
        .iter()
        .filter(|s| s.label(FUNCTION_LABEL) == Some(function))
        .map(|s| s.value)
        .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

/// Computes recent invocation rates for a set of functions.
pub struct MetricsAggregator<Q> {
    backend: Q,
    window: LookbackWindow,
    /// Maximum in-flight queries. 1 keeps the lookups sequential.
    concurrency: usize,
}

impl<Q: QueryBackend> MetricsAggregator<Q> {
    pub fn new(backend: Q, window: LookbackWindow) -> Self {
        Self {
            backend,
            window,
            concurrency: 1,
        }
    }

    /// Allow up to `n` queries in flight at once (minimum 1).
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn window(&self) -> LookbackWindow {
        self.window
    }

    /// Map each function name to its summed invocation rate.
    ///
    /// Functions whose query fails or returns no usable series are absent.
    pub async fn collect(&self, functions: &[Function]) -> HashMap<String, f64> {
        let rates: Vec<(&str, Option<f64>)> = stream::iter(functions)
            .map(|f| async move { (f.name.as_str(), self.rate_for(&f.name).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        rates
            .into_iter()
            .filter_map(|(name, rate)| rate.map(|r| (name.to_string(), r)))
            .collect()
    }

    async fn rate_for(&self, function: &str) -> Option<f64> {
        let query = invocation_rate_query(function, self.window);
        let samples = match self.backend.fetch(&escape_query(&query)).await {
            Ok(samples) => samples,
            Err(e) => {
                warn!(function = %function, error = %e, "invocation rate query failed");
                return None;
            }
        };

        let rate = sum_series(function, &samples);
        match rate {
            Some(r) => debug!(function = %function, series = samples.len(), rate = r, "invocation rate"),
            None => debug!(function = %function, "no invocation series"),
        }
        rate
    }
}
