//! idler-reconcile — the scale-to-zero control loop.
//!
//! Each cycle lists functions from the gateway, looks up their recent
//! invocation rate, and scales idle ones to zero.
//!
//! # Classification
//!
//! ```text
//! rate present, > 0   → Active    (left alone)
//! rate present, == 0  → Idle      (re-check replicas, scale to 0 if > 0)
//! rate absent         → NoData    (left alone)
//! ```
//!
//! Nothing is carried between cycles. A missed or failed cycle only
//! delays the next decision by one interval.

pub mod reconciler;
pub mod report;

pub use reconciler::Reconciler;
pub use report::{CycleReport, FunctionState};
