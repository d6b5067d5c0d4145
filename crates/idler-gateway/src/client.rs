//! Gateway HTTP client.

use std::sync::Arc;

use async_trait::async_trait;
use idler_core::{Credentials, Function, HttpClient, HttpResponse, ScaleRequest};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::error::{CallError, GatewayError};

/// Result of a scale request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaleOutcome {
    /// Dry-run mode: the request was logged but not sent.
    DryRun,
    /// The gateway answered with this status code.
    Sent { status: u16 },
    /// The request could not be delivered.
    Failed { reason: String },
}

impl ScaleOutcome {
    /// Whether the gateway accepted the request with a 2xx status.
    pub fn is_accepted(&self) -> bool {
        matches!(self, ScaleOutcome::Sent { status } if (200..300).contains(status))
    }
}

/// Operations the reconciler needs from the gateway.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// All deployed functions, in gateway order.
    async fn list_functions(&self) -> Result<Vec<Function>, GatewayError>;

    /// A single function, used to re-read its live replica count.
    async fn get_function(&self, name: &str) -> Result<Function, GatewayError>;

    /// Request `replicas` for `name`. Never fails; see [`ScaleOutcome`].
    async fn scale_function(&self, name: &str, replicas: u64) -> ScaleOutcome;
}

/// Gateway client backed by [`HttpClient`].
#[derive(Debug, Clone)]
pub struct GatewayClient {
    /// Base URL ending in `/`.
    base_url: String,
    credentials: Arc<Credentials>,
    http: HttpClient,
    dry_run: bool,
}

impl GatewayClient {
    /// Create a client. `base_url` must end in `/`.
    pub fn new(base_url: impl Into<String>, credentials: Arc<Credentials>, http: HttpClient) -> Self {
        Self {
            base_url: base_url.into(),
            credentials,
            http,
            dry_run: false,
        }
    }

    /// Suppress scale requests; they are only logged.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CallError> {
        let resp = self.http.get(&self.url(path), Some(self.credentials.as_ref())).await?;
        decode(resp)
    }
}

fn decode<T: DeserializeOwned>(resp: HttpResponse) -> Result<T, CallError> {
    if !resp.is_success() {
        return Err(CallError::Status {
            status: resp.status,
            body: resp.body_snippet(),
        });
    }
    Ok(serde_json::from_slice(&resp.body)?)
}

#[async_trait]
impl Gateway for GatewayClient {
    async fn list_functions(&self) -> Result<Vec<Function>, GatewayError> {
        self.get_json("system/functions")
            .await
            .map_err(GatewayError::List)
    }

    async fn get_function(&self, name: &str) -> Result<Function, GatewayError> {
        self.get_json(&format!("system/function/{name}"))
            .await
            .map_err(|source| GatewayError::Lookup {
                name: name.to_string(),
                source,
            })
    }

    async fn scale_function(&self, name: &str, replicas: u64) -> ScaleOutcome {
        if self.dry_run {
            info!(function = %name, replicas, "dry-run: scaling function");
            return ScaleOutcome::DryRun;
        }

        let body = ScaleRequest {
            service_name: name.to_string(),
            replicas,
        };
        let url = self.url(&format!("system/scale-function/{name}"));

        match self.http.post_json(&url, Some(self.credentials.as_ref()), &body).await {
            Ok(resp) => {
                let status = resp.status.as_u16();
                if resp.is_success() {
                    info!(function = %name, status, replicas, "scale request sent");
                } else {
                    warn!(
                        function = %name,
                        status,
                        replicas,
                        body = %resp.body_snippet(),
                        "scale request rejected"
                    );
                }
                ScaleOutcome::Sent { status }
            }
            Err(e) => {
                warn!(function = %name, replicas, error = %e, "scale request failed");
                ScaleOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::Mutex;

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};

    #[derive(Default)]
    struct Recorded {
        auth: Vec<String>,
        scales: Vec<(String, serde_json::Value)>,
    }

    type Shared = Arc<Mutex<Recorded>>;

    fn record_auth(state: &Shared, headers: &HeaderMap) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        state.lock().unwrap().auth.push(auth);
    }

    async fn fake_gateway() -> (SocketAddr, Shared) {
        let shared: Shared = Arc::default();
        let router = Router::new()
            .route(
                "/system/functions",
                get(|State(s): State<Shared>, headers: HeaderMap| async move {
                    record_auth(&s, &headers);
                    Json(serde_json::json!([
                        {"name": "f1", "availableReplicas": 2, "image": "f1:latest"},
                        {"name": "f2", "availableReplicas": 0, "image": "f2:latest"}
                    ]))
                }),
            )
            .route(
                "/system/function/{name}",
                get(
                    |State(s): State<Shared>, Path(name): Path<String>, headers: HeaderMap| async move {
                        record_auth(&s, &headers);
                        match name.as_str() {
                            "f1" => Ok(Json(serde_json::json!({"name": "f1", "availableReplicas": 3}))),
                            "garbled" => Err((StatusCode::OK, "not json")),
                            _ => Err((StatusCode::NOT_FOUND, "no such function")),
                        }
                    },
                ),
            )
            .route(
                "/system/scale-function/{name}",
                post(
                    |State(s): State<Shared>,
                     Path(name): Path<String>,
                     headers: HeaderMap,
                     Json(body): Json<serde_json::Value>| async move {
                        record_auth(&s, &headers);
                        s.lock().unwrap().scales.push((name, body));
                        StatusCode::ACCEPTED
                    },
                ),
            )
            .with_state(shared.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (addr, shared)
    }

    fn client(addr: SocketAddr) -> GatewayClient {
        GatewayClient::new(
            format!("http://{addr}/"),
            Arc::new(Credentials::new("admin", "secret")),
            HttpClient::new(),
        )
    }

    #[tokio::test]
    async fn list_functions_returns_all_records_in_order() {
        let (addr, shared) = fake_gateway().await;

        let functions = client(addr).list_functions().await.unwrap();

        let names: Vec<_> = functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["f1", "f2"]);
        assert_eq!(functions[0].available_replicas, 2);
        assert_eq!(functions[1].extra["image"], "f2:latest");
        assert_eq!(shared.lock().unwrap().auth, ["Basic YWRtaW46c2VjcmV0"]);
    }

    #[tokio::test]
    async fn get_function_reads_live_replicas() {
        let (addr, _) = fake_gateway().await;

        let f = client(addr).get_function("f1").await.unwrap();
        assert_eq!(f.available_replicas, 3);
    }

    #[tokio::test]
    async fn get_function_not_found_is_lookup_error() {
        let (addr, _) = fake_gateway().await;

        let err = client(addr).get_function("ghost").await.unwrap_err();
        match err {
            GatewayError::Lookup { name, source } => {
                assert_eq!(name, "ghost");
                assert!(matches!(source, CallError::Status { status, .. } if status == 404));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn get_function_bad_json_is_decode_error() {
        let (addr, _) = fake_gateway().await;

        let err = client(addr).get_function("garbled").await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Lookup { source: CallError::Decode(_), .. }
        ));
    }

    #[tokio::test]
    async fn scale_function_posts_request_body() {
        let (addr, shared) = fake_gateway().await;

        let outcome = client(addr).scale_function("f1", 0).await;

        assert_eq!(outcome, ScaleOutcome::Sent { status: 202 });
        assert!(outcome.is_accepted());
        let recorded = shared.lock().unwrap();
        assert_eq!(recorded.scales.len(), 1);
        assert_eq!(recorded.scales[0].0, "f1");
        assert_eq!(
            recorded.scales[0].1,
            serde_json::json!({"serviceName": "f1", "replicas": 0})
        );
        assert_eq!(recorded.auth, ["Basic YWRtaW46c2VjcmV0"]);
    }

    #[tokio::test]
    async fn dry_run_sends_nothing() {
        let (addr, shared) = fake_gateway().await;

        let outcome = client(addr).with_dry_run(true).scale_function("f1", 0).await;

        assert_eq!(outcome, ScaleOutcome::DryRun);
        assert!(!outcome.is_accepted());
        assert!(shared.lock().unwrap().scales.is_empty());
    }

    #[tokio::test]
    async fn list_against_dead_gateway_is_list_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(addr).list_functions().await.unwrap_err();
        assert!(matches!(err, GatewayError::List(CallError::Transport(_))));
    }

    #[tokio::test]
    async fn scale_against_dead_gateway_is_reported_not_raised() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let outcome = client(addr).scale_function("f1", 0).await;
        assert!(matches!(outcome, ScaleOutcome::Failed { .. }));
    }
}
