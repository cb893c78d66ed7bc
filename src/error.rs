use thiserror::Error;

use crate::signals::InterruptSignal;

/// Errors raised while configuring or starting the interrupt listener.
///
/// Once the listener task is running nothing can fail anymore: every later
/// event is only logged.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown signal name: {0:?}")]
    UnknownSignal(String),

    #[error("Signal {0} is not supported on this platform")]
    UnsupportedSignal(InterruptSignal),

    #[error("Failed to register handler for {signal}: {source}")]
    SignalRegistration {
        signal: InterruptSignal,
        #[source]
        source: std::io::Error,
    },

    #[error("Interrupt listener must be started from within a Tokio runtime")]
    NoRuntime,

    #[error("Interrupt listener was stopped and cannot be restarted")]
    ListenerStopped,
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
