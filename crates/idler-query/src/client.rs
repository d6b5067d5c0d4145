//! Query backend HTTP client.
//!
//! Issues instant queries against `/api/v1/query` and parses the vector
//! result into [`QuerySample`]s.

use std::collections::BTreeMap;

use async_trait::async_trait;
use idler_core::HttpClient;
use serde::Deserialize;
use tracing::debug;

use crate::error::QueryError;

/// One series from a query result.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySample {
    pub labels: BTreeMap<String, String>,
    pub value: f64,
}

impl QuerySample {
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }
}

/// A source of numeric time-series results.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Run an already-escaped query and return its parsed samples.
    ///
    /// Series whose value is not a finite number are dropped.
    async fn fetch(&self, escaped_query: &str) -> Result<Vec<QuerySample>, QueryError>;
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    data: QueryData,
}

#[derive(Debug, Default, Deserialize)]
struct QueryData {
    #[serde(default)]
    result: Vec<RawSeries>,
}

#[derive(Debug, Deserialize)]
struct RawSeries {
    #[serde(default)]
    metric: BTreeMap<String, String>,
    /// `[unix_timestamp, "value"]`
    #[serde(default)]
    value: Vec<serde_json::Value>,
}

impl RawSeries {
    fn into_sample(self) -> Option<QuerySample> {
        let value = match self.value.get(1) {
            Some(serde_json::Value::String(s)) => s.parse::<f64>().ok(),
            _ => None,
        };
        match value {
            Some(v) if v.is_finite() => Some(QuerySample {
                labels: self.metric,
                value: v,
            }),
            _ => {
                debug!(labels = ?self.metric, raw = ?self.value, "skipping series with unusable value");
                None
            }
        }
    }
}

/// Parse a query response body.
pub(crate) fn parse_response(body: &[u8]) -> Result<Vec<QuerySample>, QueryError> {
    let resp: QueryResponse = serde_json::from_slice(body)?;
    if !resp.status.is_empty() && resp.status != "success" {
        return Err(QueryError::Backend {
            status: resp.status,
            message: resp.error.unwrap_or_default(),
        });
    }
    Ok(resp
        .data
        .result
        .into_iter()
        .filter_map(RawSeries::into_sample)
        .collect())
}

/// Client for a Prometheus-compatible HTTP API.
#[derive(Debug, Clone)]
pub struct QueryClient {
    /// `http://host:port/api/v1/query`
    endpoint: String,
    http: HttpClient,
}

impl QueryClient {
    pub fn new(host: &str, port: u16, http: HttpClient) -> Self {
        Self {
            endpoint: format!("http://{host}:{port}/api/v1/query"),
            http,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl QueryBackend for QueryClient {
    async fn fetch(&self, escaped_query: &str) -> Result<Vec<QuerySample>, QueryError> {
        let url = format!("{}?query={}", self.endpoint, escaped_query);
        let resp = self.http.get(&url, None).await?;
        if !resp.is_success() {
            return Err(QueryError::Status {
                status: resp.status,
                body: resp.body_snippet(),
            });
        }
        parse_response(&resp.body)
    }
}
