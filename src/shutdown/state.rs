//! The `Idle -> Fired` state machine shared by both delivery adapters.
//!
//! ```text
//! ┌──────┐  first signal or request   ┌───────┐
//! │ Idle │ ─────────────────────────► │ Fired │ ◄── later events: log only
//! └──────┘                            └───────┘
//! ```
//!
//! The transition closes the [`ShutdownHandle`] and publishes on the
//! [`InterruptFeed`] in one step, so the two adapters can never disagree.

use std::fmt;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tracing::{debug, warn};

use super::feed::InterruptFeed;
use super::handle::ShutdownHandle;
use crate::metrics;
use crate::signals::InterruptSignal;

/// Lifecycle of a notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    /// Waiting for the first signal or request.
    Idle,
    /// Shutdown has begun. Permanent.
    Fired,
}

impl fmt::Display for ShutdownState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownState::Idle => write!(f, "idle"),
            ShutdownState::Fired => write!(f, "fired"),
        }
    }
}

/// Event observed by the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// An OS signal was delivered.
    Signal(InterruptSignal),
    /// Some subsystem called [`ShutdownRequest::request`](super::ShutdownRequest::request).
    Request,
}

impl Trigger {
    /// Metric label for the event source.
    pub fn source(&self) -> &'static str {
        match self {
            Trigger::Signal(_) => "signal",
            Trigger::Request => "request",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Signal(signal) => write!(f, "{signal}"),
            Trigger::Request => write!(f, "shutdown request"),
        }
    }
}

pub(crate) struct StateMachine {
    fired: AtomicBool,
    occurrences: AtomicU64,
    first_trigger: OnceLock<Trigger>,
    handle: ShutdownHandle,
    feed: InterruptFeed,
}

impl StateMachine {
    pub(crate) fn new(handle: ShutdownHandle, feed: InterruptFeed) -> Self {
        Self {
            fired: AtomicBool::new(false),
            occurrences: AtomicU64::new(0),
            first_trigger: OnceLock::new(),
            handle,
            feed,
        }
    }

    /// Record an event. Returns true only for the event that fired the transition.
    pub(crate) fn observe(&self, trigger: Trigger) -> bool {
        self.occurrences.fetch_add(1, Ordering::SeqCst);

        let first = self
            .fired
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();

        if first {
            match trigger {
                Trigger::Signal(signal) => warn!(signal = %signal, "received signal"),
                Trigger::Request => warn!("received shutdown request"),
            }
            let _ = self.first_trigger.set(trigger);
            metrics::record_interrupt(trigger.source(), metrics::PHASE_INITIAL);
            metrics::set_shutdown_fired(true);

            self.handle.fire();
            let delivered = self.feed.publish();
            debug!(subscribers = delivered, "Shutdown notification published");
        } else {
            match trigger {
                Trigger::Signal(signal) => warn!(signal = %signal, "received signal (repeated)"),
                Trigger::Request => warn!("received shutdown request (repeated)"),
            }
            metrics::record_interrupt(trigger.source(), metrics::PHASE_REPEATED);
        }

        first
    }

    pub(crate) fn state(&self) -> ShutdownState {
        if self.fired.load(Ordering::SeqCst) {
            ShutdownState::Fired
        } else {
            ShutdownState::Idle
        }
    }

    pub(crate) fn occurrences(&self) -> u64 {
        self.occurrences.load(Ordering::SeqCst)
    }

    pub(crate) fn first_trigger(&self) -> Option<Trigger> {
        self.first_trigger.get().copied()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    fn machine() -> (StateMachine, ShutdownHandle, InterruptFeed) {
        let handle = ShutdownHandle::new();
        let feed = InterruptFeed::default();
        (
            StateMachine::new(handle.clone(), feed.clone()),
            handle,
            feed,
        )
    }

    #[test]
    fn test_starts_idle() {
        let (sm, handle, _) = machine();
        assert_eq!(sm.state(), ShutdownState::Idle);
        assert_eq!(sm.occurrences(), 0);
        assert_eq!(sm.first_trigger(), None);
        assert!(!handle.is_fired());
    }

    #[test]
    fn test_first_event_fires_both_adapters() {
        let (sm, handle, feed) = machine();
        let mut sub = feed.subscribe();

        assert!(sm.observe(Trigger::Signal(InterruptSignal::Interrupt)));

        assert_eq!(sm.state(), ShutdownState::Fired);
        assert!(handle.is_fired());
        assert_eq!(sub.try_recv(), Some(()));
        assert_eq!(
            sm.first_trigger(),
            Some(Trigger::Signal(InterruptSignal::Interrupt))
        );
    }

    #[test]
    fn test_later_events_only_count() {
        let (sm, handle, feed) = machine();
        let mut sub = feed.subscribe();

        assert!(sm.observe(Trigger::Request));
        assert!(!sm.observe(Trigger::Request));
        assert!(!sm.observe(Trigger::Signal(InterruptSignal::Terminate)));

        assert_eq!(sm.occurrences(), 3);
        assert_eq!(sm.first_trigger(), Some(Trigger::Request));
        assert!(handle.is_fired());
        assert_eq!(sub.try_recv(), Some(()));
        assert_eq!(sub.try_recv(), None);
    }

    #[test]
    fn test_concurrent_observers_fire_once() {
        let (sm, _, _) = machine();
        let sm = std::sync::Arc::new(sm);

        let winners: usize = (0..8)
            .map(|_| {
                let sm = sm.clone();
                std::thread::spawn(move || sm.observe(Trigger::Request))
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|t| usize::from(t.join().unwrap()))
            .sum();

        assert_eq!(winners, 1);
        assert_eq!(sm.occurrences(), 8);
    }

    #[test]
    fn test_trigger_display() {
        assert_eq!(
            Trigger::Signal(InterruptSignal::Terminate).to_string(),
            "SIGTERM"
        );
        assert_eq!(Trigger::Request.to_string(), "shutdown request");
        assert_eq!(Trigger::Request.source(), "request");
        assert_eq!(ShutdownState::Fired.to_string(), "fired");
    }

    /// Log sink shared between the subscriber and the test.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn lines(&self) -> Vec<String> {
            String::from_utf8(self.0.lock().unwrap().clone())
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    fn observe_with_logs(triggers: &[Trigger]) -> Vec<String> {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let (sm, _, _) = machine();
        tracing::subscriber::with_default(subscriber, || {
            for trigger in triggers {
                sm.observe(*trigger);
            }
        });

        logs.lines()
    }

    #[test]
    fn test_request_then_two_repeats_logs_one_initial_and_two_repeated() {
        let lines = observe_with_logs(&[Trigger::Request, Trigger::Request, Trigger::Request]);

        let initial: Vec<_> = lines
            .iter()
            .filter(|l| l.contains("received shutdown request") && !l.contains("(repeated)"))
            .collect();
        let repeated: Vec<_> = lines
            .iter()
            .filter(|l| l.contains("received shutdown request (repeated)"))
            .collect();

        assert_eq!(initial.len(), 1);
        assert_eq!(repeated.len(), 2);
        assert!(initial.iter().chain(&repeated).all(|l| l.contains("WARN")));
    }

    #[test]
    fn test_signal_entries_carry_signal_name() {
        let lines = observe_with_logs(&[
            Trigger::Signal(InterruptSignal::Terminate),
            Trigger::Signal(InterruptSignal::Interrupt),
        ]);

        let initial = lines
            .iter()
            .find(|l| l.contains("received signal") && !l.contains("(repeated)"))
            .unwrap();
        assert!(initial.contains("WARN"));
        assert!(initial.contains("signal=SIGTERM"));

        let repeated = lines
            .iter()
            .find(|l| l.contains("received signal (repeated)"))
            .unwrap();
        assert!(repeated.contains("WARN"));
        assert!(repeated.contains("signal=SIGINT"));
    }
}
