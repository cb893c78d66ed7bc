//! Programmatic shutdown request.

use std::sync::Arc;

use tokio::sync::Notify;

/// In-process analog of an interrupt signal.
///
/// Any subsystem holding a clone can call [`request`](Self::request) to start
/// shutdown through the same path as Ctrl+C. The trigger is single-slot: a
/// request nobody is waiting for is kept as one pending occurrence, and
/// further requests before it is observed collapse into it.
#[derive(Debug, Clone, Default)]
pub struct ShutdownRequest {
    notify: Arc<Notify>,
}

impl ShutdownRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Wakes exactly one pending waiter.
    pub fn request(&self) {
        self.notify.notify_one();
    }

    /// Wait for the next request, consuming the pending one if present.
    pub(crate) async fn requested(&self) {
        self.notify.notified().await;
    }
}
