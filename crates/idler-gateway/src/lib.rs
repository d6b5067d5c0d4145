//! idler-gateway — client for the function gateway API.
//!
//! Lists deployed functions, re-reads a single function's replica count,
//! and sends scale requests. Every call carries HTTP Basic credentials.
//!
//! ```text
//! GET  {base}system/functions              → Vec<Function>
//! GET  {base}system/function/{name}        → Function
//! POST {base}system/scale-function/{name}  ← {"serviceName", "replicas"}
//! ```
//!
//! Scaling is fire-and-forget: the status code is logged and returned as
//! a [`ScaleOutcome`], never as an error. In dry-run mode no request is
//! sent at all.

pub mod client;
pub mod error;

pub use client::{Gateway, GatewayClient, ScaleOutcome};
pub use error::{CallError, GatewayError};
