//! One-shot shutdown gate.

use tokio_util::sync::CancellationToken;

/// Readiness handle that flips from open to fired exactly once.
///
/// Clones observe the same gate. Waiting does not consume anything, so any
/// number of tasks can poll or await it.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    token: CancellationToken,
}

impl ShutdownHandle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Non-blocking check whether shutdown has begun.
    pub fn is_fired(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolve once shutdown has begun. Returns immediately if it already has.
    pub async fn fired(&self) {
        self.token.cancelled().await;
    }

    /// Token cancelled together with the gate.
    ///
    /// Cancelling the returned token does not fire the gate, so it can be
    /// handed to subsystems that also stop for their own reasons.
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    pub(crate) fn fire(&self) {
        self.token.cancel();
    }
}

/// Returns true once the handle has fired.
///
/// Lets early-exit checks use a plain `if` instead of a `select!`.
pub fn interrupt_requested(handle: &ShutdownHandle) -> bool {
    handle.is_fired()
}
