//! # Interrupt Notifier
//!
//! Process-wide shutdown signaling. Listens for OS interrupt signals
//! (Ctrl+C and any configured extras) and for programmatic shutdown
//! requests, then tells the rest of the process exactly once that shutdown
//! has begun. Later signals are only logged, so an operator pressing Ctrl+C
//! again sees the process is still alive and shutting down.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  OS signals (SignalSet)        ShutdownRequest::request()   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Listener task (one per ShutdownCoordinator)                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  StateMachine  Idle ──► Fired   (exactly once)              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ShutdownHandle (one-shot gate)  │  InterruptFeed (pub/sub) │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use interrupt_notifier::{Config, ShutdownCoordinator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let coordinator = ShutdownCoordinator::from_config(&config);
//!
//!     // Gate for the main loop, feed for everything else
//!     let handle = coordinator.interrupt_listener()?;
//!     let mut worker = coordinator.feed().subscribe();
//!     tokio::spawn(async move {
//!         worker.recv().await;
//!     });
//!
//!     handle.fired().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Signal Configuration
//!
//! Subscribe to SIGTERM as well as Ctrl+C:
//! ```bash
//! INTERRUPT_SIGNALS=SIGINT,SIGTERM cargo run
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod shutdown;
pub mod signals;
pub mod utils;

// Re-exports for convenience
pub use config::{Config, LogFormat};
pub use error::{AppError, AppResult};
pub use shutdown::{
    InterruptFeed, InterruptSubscription, ShutdownCoordinator, ShutdownCoordinatorBuilder,
    ShutdownHandle, ShutdownRequest, ShutdownState, Trigger, interrupt_requested,
};
pub use signals::{InterruptSignal, SignalListener, SignalSet};
