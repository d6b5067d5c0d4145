//! Domain types exchanged with the gateway.
//!
//! `Function` mirrors the gateway's function record. Only the fields the
//! reconciler needs are typed; everything else is kept verbatim in
//! `extra` so a record round-trips unchanged.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// A deployed function as reported by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Function {
    pub name: String,
    /// Ready replicas at lookup time.
    #[serde(default)]
    pub available_replicas: u64,
    /// Remaining gateway metadata (image, labels, replicas, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Function {
    /// Build a record with no extra metadata.
    pub fn new(name: impl Into<String>, available_replicas: u64) -> Self {
        Self {
            name: name.into(),
            available_replicas,
            extra: serde_json::Map::new(),
        }
    }

    /// Whether any replica is currently running.
    pub fn is_running(&self) -> bool {
        self.available_replicas > 0
    }
}

/// Body of a scale request sent to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScaleRequest {
    pub service_name: String,
    pub replicas: u64,
}

impl ScaleRequest {
    pub fn to_zero(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            replicas: 0,
        }
    }
}

/// Basic-auth credentials for the gateway.
///
/// Empty values are legal and are sent as-is; the gateway decides whether
/// to accept them.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Value for the `Authorization` header.
    pub fn basic_auth_header(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {token}")
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && self.password.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &if self.password.is_empty() { "" } else { "<redacted>" })
            .finish()
    }
}
