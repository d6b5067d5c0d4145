//! Reconciler — one list → measure → classify → scale pass per cycle.

use std::time::Duration;

use idler_gateway::{Gateway, GatewayError};
use idler_query::{MetricsAggregator, QueryBackend};
use tracing::{debug, info, warn};

use crate::report::{CycleReport, FunctionState};

/// Drives scale-to-zero decisions for every function on a gateway.
pub struct Reconciler<G, Q> {
    gateway: G,
    aggregator: MetricsAggregator<Q>,
}

impl<G: Gateway, Q: QueryBackend> Reconciler<G, Q> {
    pub fn new(gateway: G, aggregator: MetricsAggregator<Q>) -> Self {
        Self {
            gateway,
            aggregator,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Run a single cycle.
    ///
    /// Fails only when the function list cannot be read; every later
    /// failure is logged and limited to the function it concerns.
    pub async fn reconcile_once(&self) -> Result<CycleReport, GatewayError> {
        let functions = self.gateway.list_functions().await?;
        debug!(count = functions.len(), "listed functions");

        let rates = self.aggregator.collect(&functions).await;

        let mut report = CycleReport::default();
        for function in &functions {
            let name = function.name.as_str();
            let state = FunctionState::from_rate(rates.get(name).copied());
            report.states.push((name.to_string(), state));

            match state {
                FunctionState::Active(rate) => {
                    info!(function = %name, rate, "active");
                }
                FunctionState::NoData => {
                    debug!(function = %name, "no invocation data, skipping");
                }
                FunctionState::Idle => {
                    info!(function = %name, "idle");
                    self.scale_down_if_running(name, &mut report).await;
                }
            }
        }

        Ok(report)
    }

    /// Re-read the live replica count and scale to zero only if running.
    async fn scale_down_if_running(&self, name: &str, report: &mut CycleReport) {
        report.rechecked.push(name.to_string());

        let live = match self.gateway.get_function(name).await {
            Ok(f) => f,
            Err(e) => {
                warn!(function = %name, error = %e, "replica re-check failed, skipping");
                report.lookup_failures.push(name.to_string());
                return;
            }
        };

        if !live.is_running() {
            debug!(function = %name, "already at zero replicas");
            report.already_zero.push(name.to_string());
            return;
        }

        debug!(function = %name, replicas = live.available_replicas, "scaling to zero");
        let outcome = self.gateway.scale_function(name, 0).await;
        report.scaled.push((name.to_string(), outcome));
    }

    /// Run cycles until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// The first cycle starts immediately; `interval` is the pause after
    /// each cycle completes.
    pub async fn run(&self, interval: Duration, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        info!(
            interval_secs = interval.as_secs(),
            window = %self.aggregator.window(),
            "reconciler started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.reconcile_once().await {
                Ok(report) => info!(
                    functions = report.states.len(),
                    active = report.active_count(),
                    idle = report.idle_count(),
                    no_data = report.no_data_count(),
                    scaled = report.scaled.len(),
                    "reconcile cycle complete"
                ),
                Err(e) => warn!(error = %e, "reconcile cycle aborted"),
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("reconciler shutting down");
    }
}
