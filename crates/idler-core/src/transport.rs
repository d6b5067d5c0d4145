//! Minimal HTTP/1 client for gateway and query backend calls.
//!
//! Each request opens a fresh TCP connection, performs a hyper HTTP/1
//! handshake, and reads the full response body. Only `http://` URLs are
//! supported.

use std::time::Duration;

use bytes::Bytes;
use http::{Method, Request, Uri};
use http_body_util::{BodyExt, Full};
use serde::Serialize;
use tracing::debug;

use crate::error::HttpError;
use crate::types::Credentials;

pub use http::StatusCode;

const USER_AGENT: &str = concat!("faas-idler/", env!("CARGO_PKG_VERSION"));

/// A fully-read HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as lossy UTF-8, truncated for log output.
    pub fn body_snippet(&self) -> String {
        let text = String::from_utf8_lossy(&self.body);
        text.chars().take(256).collect()
    }
}

/// HTTP client with an optional per-request timeout.
#[derive(Debug, Clone, Default)]
pub struct HttpClient {
    timeout: Option<Duration>,
}

impl HttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound every request by `timeout`. `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Issue a GET request.
    pub async fn get(
        &self,
        url: &str,
        credentials: Option<&Credentials>,
    ) -> Result<HttpResponse, HttpError> {
        self.send(Method::GET, url, credentials, None).await
    }

    /// Issue a POST request with a JSON body.
    pub async fn post_json<T: Serialize>(
        &self,
        url: &str,
        credentials: Option<&Credentials>,
        body: &T,
    ) -> Result<HttpResponse, HttpError> {
        let payload = Bytes::from(serde_json::to_vec(body)?);
        self.send(Method::POST, url, credentials, Some(payload)).await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        credentials: Option<&Credentials>,
        body: Option<Bytes>,
    ) -> Result<HttpResponse, HttpError> {
        let exchange = self.exchange(method, url, credentials, body);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .map_err(|_| HttpError::Timeout(limit))?,
            None => exchange.await,
        }
    }

    async fn exchange(
        &self,
        method: Method,
        url: &str,
        credentials: Option<&Credentials>,
        body: Option<Bytes>,
    ) -> Result<HttpResponse, HttpError> {
        let target = Target::parse(url)?;

        let stream = tokio::net::TcpStream::connect(&target.address)
            .await
            .map_err(|source| HttpError::Connect {
                address: target.address.clone(),
                source,
            })?;

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(HttpError::Handshake)?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "http connection closed with error");
            }
        });

        let mut builder = Request::builder()
            .method(method.clone())
            .uri(target.path_and_query.as_str())
            .header(http::header::HOST, target.address.as_str())
            .header(http::header::USER_AGENT, USER_AGENT);
        if let Some(creds) = credentials {
            builder = builder.header(http::header::AUTHORIZATION, creds.basic_auth_header());
        }
        if body.is_some() {
            builder = builder.header(http::header::CONTENT_TYPE, "application/json");
        }
        let req = builder.body(Full::new(body.unwrap_or_default()))?;

        let resp = sender.send_request(req).await.map_err(HttpError::Request)?;
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(HttpError::Body)?
            .to_bytes();

        debug!(%method, url, %status, bytes = body.len(), "http exchange complete");

        Ok(HttpResponse { status, body })
    }
}

/// Connection address and request target split out of a URL.
#[derive(Debug, PartialEq, Eq)]
struct Target {
    address: String,
    path_and_query: String,
}

impl Target {
    fn parse(url: &str) -> Result<Self, HttpError> {
        let invalid = |reason: &str| HttpError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let uri: Uri = url.parse().map_err(|e: http::uri::InvalidUri| invalid(&e.to_string()))?;
        if uri.scheme_str() != Some("http") {
            return Err(invalid("only http:// urls are supported"));
        }
        let host = uri.host().ok_or_else(|| invalid("missing host"))?;
        let port = uri.port_u16().unwrap_or(80);
        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .filter(|pq| !pq.is_empty())
            .unwrap_or_else(|| "/".to_string());

        Ok(Self {
            address: format!("{host}:{port}"),
            path_and_query,
        })
    }
}
