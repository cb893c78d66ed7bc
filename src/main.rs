use std::process::ExitCode;

use tracing::{error, info, warn};

use interrupt_notifier::{AppError, Config, LogFormat, ShutdownCoordinator, metrics, utils};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            utils::init_tracing("info", LogFormat::Pretty);
            error!("Configuration error: {e}");
            return ExitCode::from(exitcode::CONFIG as u8);
        }
    };

    utils::init_tracing(&config.log_level, config.log_format);

    info!(
        "Starting Interrupt Notifier v{}",
        env!("CARGO_PKG_VERSION")
    );

    match run(config).await {
        Ok(()) => ExitCode::from(exitcode::OK as u8),
        Err(exit_code) => ExitCode::from(exit_code as u8),
    }
}

/// Run until interrupted, returning an exit code on error.
async fn run(config: Config) -> Result<(), exitcode::ExitCode> {
    info!(
        signals = %config.interrupt_signals,
        grace = ?config.shutdown_grace,
        "Configuration loaded"
    );

    if let Some(addr) = config.metrics_addr() {
        metrics::try_init_metrics(addr);
    }

    let coordinator = ShutdownCoordinator::from_config(&config);

    // Subscribe before starting so the worker cannot miss the event
    let mut subscription = coordinator.feed().subscribe();
    let worker = tokio::spawn(async move {
        if subscription.recv().await.is_some() {
            info!("Worker received shutdown notification");
        }
    });

    let handle = coordinator.interrupt_listener().map_err(|e| {
        error!("Failed to start interrupt listener: {e}");
        match e {
            AppError::SignalRegistration { .. } => exitcode::OSERR,
            _ => exitcode::SOFTWARE,
        }
    })?;
    coordinator.start_interrupt_listener().map_err(|e| {
        error!("Failed to start interrupt notifier: {e}");
        exitcode::SOFTWARE
    })?;

    info!("Running. Press Ctrl+C to stop");
    handle.fired().await;

    if let Some(trigger) = coordinator.first_trigger() {
        info!(%trigger, "Shutdown started");
    }

    if worker.await.is_err() {
        warn!("Worker task ended abnormally");
    }

    // Keep the listener alive so repeated interrupts are acknowledged
    info!(grace = ?config.shutdown_grace, "Waiting before exit");
    tokio::time::sleep(config.shutdown_grace).await;

    info!(
        events = coordinator.occurrences(),
        "Shutdown complete"
    );
    Ok(())
}
