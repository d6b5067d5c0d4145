//! idler-core — shared building blocks for faas-idler.
//!
//! Holds the domain types exchanged with the gateway, the process
//! configuration, duration parsing, and a minimal HTTP/1 client used by
//! both the gateway and the query backend clients.
//!
//! # Architecture
//!
//! ```text
//! IdlerConfig (env) ──► LookbackWindow ──► idler-query
//!        │
//!        └──► Credentials + HttpClient ──► idler-gateway, idler-query
//! ```

pub mod config;
pub mod duration;
pub mod error;
pub mod transport;
pub mod types;

pub use config::IdlerConfig;
pub use duration::{LookbackWindow, parse_duration};
pub use error::{ConfigError, HttpError};
pub use transport::{HttpClient, HttpResponse, StatusCode};
pub use types::*;
