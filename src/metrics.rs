//! Prometheus metrics for the interrupt listener.
//!
//! # Available Metrics
//!
//! ## Counters
//! - `interrupt_events_total` - Events observed (labels: source = signal|request,
//!   phase = initial|repeated)
//!
//! ## Gauges
//! - `interrupt_shutdown_fired` - 1 once shutdown has begun, 0 before
//!
//! Recording functions are no-ops until an exporter is installed with
//! [`init_metrics`].

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{error, info};

/// Metric names as constants for consistency.
pub mod names {
    pub const INTERRUPT_EVENTS_TOTAL: &str = "interrupt_events_total";
    pub const SHUTDOWN_FIRED: &str = "interrupt_shutdown_fired";
}

/// `phase` label for the event that fired shutdown.
pub const PHASE_INITIAL: &str = "initial";
/// `phase` label for events after shutdown has begun.
pub const PHASE_REPEATED: &str = "repeated";

/// Install the Prometheus exporter and describe all metrics.
///
/// # Errors
///
/// Returns a message if the exporter cannot be installed (e.g. port in use
/// or a recorder is already set).
pub fn init_metrics(metrics_addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        names::INTERRUPT_EVENTS_TOTAL,
        "Interrupt signals and shutdown requests observed"
    );
    describe_gauge!(
        names::SHUTDOWN_FIRED,
        "Shutdown state (1 = fired, 0 = idle)"
    );
    set_shutdown_fired(false);

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Try to initialize metrics, logging any errors but not failing.
pub fn try_init_metrics(metrics_addr: SocketAddr) {
    if let Err(e) = init_metrics(metrics_addr) {
        error!(error = %e, "Failed to initialize metrics, continuing without metrics");
    }
}

/// Count one observed event.
pub fn record_interrupt(source: &'static str, phase: &'static str) {
    counter!(names::INTERRUPT_EVENTS_TOTAL, "source" => source, "phase" => phase).increment(1);
}

/// Update the shutdown state gauge.
pub fn set_shutdown_fired(fired: bool) {
    gauge!(names::SHUTDOWN_FIRED).set(if fired { 1.0 } else { 0.0 });
}

#[cfg(test)]
mod tests {
    use super::*;

    // These only check that recording without an exporter does not panic.

    #[test]
    fn test_record_interrupt() {
        record_interrupt("signal", PHASE_INITIAL);
        record_interrupt("request", PHASE_REPEATED);
    }

    #[test]
    fn test_set_shutdown_fired() {
        set_shutdown_fired(false);
        set_shutdown_fired(true);
    }
}
