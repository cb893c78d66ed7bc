//! Shutdown coordination.
//!
//! A [`ShutdownCoordinator`] is built once at process start and handed to
//! every subsystem that raises or observes shutdown. It owns:
//!
//! - the [`ShutdownRequest`] trigger subsystems raise programmatically;
//! - the [`SignalSet`] the listener subscribes to;
//! - one [`ShutdownHandle`] gate and one [`InterruptFeed`].
//!
//! # Data Flow
//!
//! ```text
//! OS signal ──┐
//!             ├──► listener task ──► StateMachine ──┬──► ShutdownHandle (gate)
//! request() ──┘                     Idle -> Fired   └──► InterruptFeed  (broadcast)
//! ```
//!
//! Both entry points, [`interrupt_listener`](ShutdownCoordinator::interrupt_listener)
//! and [`start_interrupt_listener`](ShutdownCoordinator::start_interrupt_listener),
//! share the single listener task. Whichever is called first spawns it.
//!
//! # Structured Concurrency
//!
//! The listener is spawned on a `TaskTracker` and watches a private
//! `CancellationToken`. In production it runs until the process exits;
//! [`stop`](ShutdownCoordinator::stop) ends it deterministically, which is
//! what tests use.

mod feed;
mod handle;
mod state;
mod trigger;

pub use feed::{InterruptFeed, InterruptSubscription};
pub use handle::{ShutdownHandle, interrupt_requested};
pub use state::{ShutdownState, Trigger};
pub use trigger::ShutdownRequest;

use std::sync::{Arc, Mutex, PoisonError};

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::signals::{SignalListener, SignalSet};
use state::StateMachine;

/// Process-scoped owner of the shutdown state machine.
///
/// Cheap to clone; clones share everything.
///
/// ```rust,no_run
/// use interrupt_notifier::{ShutdownCoordinator, interrupt_requested};
///
/// # async fn demo() -> interrupt_notifier::AppResult<()> {
/// let coordinator = ShutdownCoordinator::new();
/// let handle = coordinator.interrupt_listener()?;
///
/// // hand `coordinator.requester()` to subsystems that may ask for shutdown
/// while !interrupt_requested(&handle) {
///     // do work
/// #   break;
/// }
/// handle.fired().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ShutdownCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    signals: SignalSet,
    request: ShutdownRequest,
    handle: ShutdownHandle,
    feed: InterruptFeed,
    machine: Arc<StateMachine>,
    /// Set once the listener task has been spawned.
    listening: Mutex<bool>,
    task_tracker: TaskTracker,
    cancellation_token: CancellationToken,
}

impl ShutdownCoordinator {
    /// Coordinator with the default signal set (Ctrl+C only).
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ShutdownCoordinatorBuilder {
        ShutdownCoordinatorBuilder::default()
    }

    /// Coordinator using the signal set from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::builder()
            .signals(config.interrupt_signals.clone())
            .build()
    }

    /// Start the listener if needed and return the one-shot gate.
    ///
    /// # Errors
    ///
    /// Fails when called outside a Tokio runtime or when an OS handler
    /// cannot be registered. Nothing is spawned in that case. Returns
    /// `AppError::ListenerStopped` after [`stop`](Self::stop), since no task
    /// would be left to fire the gate.
    pub fn interrupt_listener(&self) -> AppResult<ShutdownHandle> {
        self.ensure_listening()?;
        Ok(self.inner.handle.clone())
    }

    /// Start the listener if needed. The event is delivered on [`feed`](Self::feed).
    ///
    /// # Errors
    ///
    /// Same as [`interrupt_listener`](Self::interrupt_listener).
    pub fn start_interrupt_listener(&self) -> AppResult<()> {
        self.ensure_listening()
    }

    /// Trigger subsystems use to request shutdown.
    pub fn requester(&self) -> ShutdownRequest {
        self.inner.request.clone()
    }

    /// Request shutdown through the coordinator's own trigger.
    pub fn request_shutdown(&self) {
        self.inner.request.request();
    }

    /// The gate, without starting the listener.
    pub fn handle(&self) -> ShutdownHandle {
        self.inner.handle.clone()
    }

    /// The broadcast feed. Subscribe before the event to receive it.
    pub fn feed(&self) -> &InterruptFeed {
        &self.inner.feed
    }

    pub fn signals(&self) -> &SignalSet {
        &self.inner.signals
    }

    pub fn state(&self) -> ShutdownState {
        self.inner.machine.state()
    }

    /// Event that caused the transition, once fired.
    pub fn first_trigger(&self) -> Option<Trigger> {
        self.inner.machine.first_trigger()
    }

    /// Total events observed, the firing one included.
    pub fn occurrences(&self) -> u64 {
        self.inner.machine.occurrences()
    }

    /// Whether the listener task has been spawned.
    pub fn is_listening(&self) -> bool {
        *self.lock_listening()
    }

    /// Stop the listener task and wait for it to exit.
    ///
    /// Does not fire the gate or the feed. Later calls to either entry point
    /// fail with `AppError::ListenerStopped`.
    pub async fn stop(&self) {
        info!("Stopping interrupt listener");

        self.inner.cancellation_token.cancel();
        self.inner.task_tracker.close();
        self.inner.task_tracker.wait().await;

        debug!("Interrupt listener stopped");
    }

    fn ensure_listening(&self) -> AppResult<()> {
        let mut listening = self.lock_listening();
        if self.inner.cancellation_token.is_cancelled() {
            return Err(AppError::ListenerStopped);
        }
        if *listening {
            return Ok(());
        }

        let runtime = Handle::try_current().map_err(|_| AppError::NoRuntime)?;
        let signals = SignalListener::register(&self.inner.signals)?;

        let subscribed = signals.signals();
        self.inner.task_tracker.spawn_on(
            run_listener(
                signals,
                self.inner.request.clone(),
                self.inner.machine.clone(),
                self.inner.cancellation_token.clone(),
            ),
            &runtime,
        );
        *listening = true;

        info!(signals = %subscribed, "Interrupt listener started");
        Ok(())
    }

    fn lock_listening(&self) -> std::sync::MutexGuard<'_, bool> {
        self.inner
            .listening
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`ShutdownCoordinator`].
#[derive(Debug, Clone, Default)]
pub struct ShutdownCoordinatorBuilder {
    signals: SignalSet,
    request: Option<ShutdownRequest>,
}

impl ShutdownCoordinatorBuilder {
    /// Override the signal set. Fixed once the coordinator is built.
    pub fn signals(mut self, signals: SignalSet) -> Self {
        self.signals = signals;
        self
    }

    /// Reuse an existing trigger instead of creating a fresh one.
    pub fn request(mut self, request: ShutdownRequest) -> Self {
        self.request = Some(request);
        self
    }

    pub fn build(self) -> ShutdownCoordinator {
        let handle = ShutdownHandle::new();
        let feed = InterruptFeed::new();
        let machine = Arc::new(StateMachine::new(handle.clone(), feed.clone()));

        ShutdownCoordinator {
            inner: Arc::new(Inner {
                signals: self.signals,
                request: self.request.unwrap_or_default(),
                handle,
                feed,
                machine,
                listening: Mutex::new(false),
                task_tracker: TaskTracker::new(),
                cancellation_token: CancellationToken::new(),
            }),
        }
    }
}

/// Listener loop. Runs until `cancel` fires, which in production is never.
async fn run_listener(
    mut signals: SignalListener,
    request: ShutdownRequest,
    machine: Arc<StateMachine>,
    cancel: CancellationToken,
) {
    loop {
        let trigger = tokio::select! {
            biased;

            _ = cancel.cancelled() => break,
            signal = signals.recv() => Trigger::Signal(signal),
            _ = request.requested() => Trigger::Request,
        };

        machine.observe(trigger);
    }
}
