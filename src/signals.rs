//! OS signal kinds and subscription.
//!
//! [`SignalSet`] is the ordered list of signals a listener subscribes to.
//! The default set only holds the platform interrupt signal (Ctrl+C);
//! [`SignalSet::platform`] adds the termination signal on Unix.
//!
//! [`SignalListener`] registers the OS handlers for a set and yields each
//! delivery as an [`InterruptSignal`].
//!
//! # Platforms
//!
//! - **Unix**: every [`InterruptSignal`] variant is available.
//! - **Windows**: only [`InterruptSignal::Interrupt`] (Ctrl+C) is available.

use std::fmt;
use std::future::poll_fn;
use std::str::FromStr;
use std::task::{Context, Poll};

use crate::error::{AppError, AppResult};

/// An OS signal the notifier can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterruptSignal {
    /// SIGINT / Ctrl+C.
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// SIGQUIT.
    Quit,
    /// SIGHUP.
    Hangup,
    /// SIGUSR1.
    User1,
    /// SIGUSR2.
    User2,
}

impl InterruptSignal {
    /// Every known signal kind, in canonical order.
    pub const ALL: [InterruptSignal; 6] = [
        InterruptSignal::Interrupt,
        InterruptSignal::Terminate,
        InterruptSignal::Quit,
        InterruptSignal::Hangup,
        InterruptSignal::User1,
        InterruptSignal::User2,
    ];

    /// Canonical `SIGxxx` name.
    pub fn name(self) -> &'static str {
        match self {
            InterruptSignal::Interrupt => "SIGINT",
            InterruptSignal::Terminate => "SIGTERM",
            InterruptSignal::Quit => "SIGQUIT",
            InterruptSignal::Hangup => "SIGHUP",
            InterruptSignal::User1 => "SIGUSR1",
            InterruptSignal::User2 => "SIGUSR2",
        }
    }

    /// Whether a handler for this signal can be registered on this platform.
    pub fn is_supported(self) -> bool {
        cfg!(unix) || self == InterruptSignal::Interrupt
    }

    #[cfg(unix)]
    fn kind(self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;

        match self {
            InterruptSignal::Interrupt => SignalKind::interrupt(),
            InterruptSignal::Terminate => SignalKind::terminate(),
            InterruptSignal::Quit => SignalKind::quit(),
            InterruptSignal::Hangup => SignalKind::hangup(),
            InterruptSignal::User1 => SignalKind::user_defined1(),
            InterruptSignal::User2 => SignalKind::user_defined2(),
        }
    }
}

impl fmt::Display for InterruptSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InterruptSignal {
    type Err = AppError;

    /// Accepts `SIGINT`, `INT`, `interrupt`, `ctrl-c` and so on, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();
        let bare = upper.strip_prefix("SIG").unwrap_or(upper.as_str());

        let signal = match bare {
            "INT" | "INTERRUPT" | "CTRL-C" | "CTRL_C" | "CTRLC" => InterruptSignal::Interrupt,
            "TERM" | "TERMINATE" => InterruptSignal::Terminate,
            "QUIT" => InterruptSignal::Quit,
            "HUP" | "HANGUP" => InterruptSignal::Hangup,
            "USR1" | "USER1" => InterruptSignal::User1,
            "USR2" | "USER2" => InterruptSignal::User2,
            _ => return Err(AppError::UnknownSignal(trimmed.to_string())),
        };

        Ok(signal)
    }
}

/// Ordered, duplicate-free list of signals to subscribe to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalSet {
    signals: Vec<InterruptSignal>,
}

impl SignalSet {
    /// Build a set from signals in priority order. Later duplicates are dropped.
    pub fn new(signals: impl IntoIterator<Item = InterruptSignal>) -> Self {
        let mut set = Self {
            signals: Vec::new(),
        };
        for signal in signals {
            set.push(signal);
        }
        set
    }

    /// Platform-specific set: SIGINT and SIGTERM on Unix, Ctrl+C elsewhere.
    pub fn platform() -> Self {
        #[cfg(unix)]
        {
            Self::new([InterruptSignal::Interrupt, InterruptSignal::Terminate])
        }

        #[cfg(not(unix))]
        {
            Self::default()
        }
    }

    /// Append a signal unless it is already present.
    pub fn push(&mut self, signal: InterruptSignal) {
        if !self.signals.contains(&signal) {
            self.signals.push(signal);
        }
    }

    pub fn contains(&self, signal: InterruptSignal) -> bool {
        self.signals.contains(&signal)
    }

    pub fn iter(&self) -> impl Iterator<Item = InterruptSignal> + '_ {
        self.signals.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// First signal in the set that cannot be registered on this platform.
    pub fn first_unsupported(&self) -> Option<InterruptSignal> {
        self.iter().find(|signal| !signal.is_supported())
    }
}

impl Default for SignalSet {
    fn default() -> Self {
        Self::new([InterruptSignal::Interrupt])
    }
}

impl fmt::Display for SignalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for signal in &self.signals {
            if !first {
                f.write_str(",")?;
            }
            f.write_str(signal.name())?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for SignalSet {
    type Err = AppError;

    /// Parse a comma-separated list such as `SIGINT,SIGTERM`. Blank entries are skipped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::parse)
            .collect::<AppResult<Vec<_>>>()
            .map(Self::new)
    }
}

#[cfg(unix)]
type Subscription = tokio::signal::unix::Signal;

#[cfg(windows)]
type Subscription = tokio::signal::windows::CtrlC;

#[cfg(not(any(unix, windows)))]
compile_error!("interrupt_notifier supports only Unix and Windows targets");

/// Registered OS handlers for a [`SignalSet`].
///
/// Registration must happen inside a Tokio runtime. Handlers stay installed
/// for the lifetime of the process, even after the listener is dropped.
pub struct SignalListener {
    subscriptions: Vec<(InterruptSignal, Subscription)>,
}

impl SignalListener {
    /// Install handlers for every signal in `set`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::UnsupportedSignal` for signals the platform lacks and
    /// `AppError::SignalRegistration` when the OS refuses a handler.
    pub fn register(set: &SignalSet) -> AppResult<Self> {
        let mut subscriptions = Vec::with_capacity(set.len());
        for signal in set.iter() {
            if !signal.is_supported() {
                return Err(AppError::UnsupportedSignal(signal));
            }
            let subscription = subscribe(signal)
                .map_err(|source| AppError::SignalRegistration { signal, source })?;
            subscriptions.push((signal, subscription));
        }
        Ok(Self { subscriptions })
    }

    /// Signals this listener is subscribed to, in priority order.
    pub fn signals(&self) -> SignalSet {
        SignalSet::new(self.subscriptions.iter().map(|(signal, _)| *signal))
    }

    /// Wait for the next delivery of any subscribed signal.
    ///
    /// Cancel safe. With an empty set this never completes.
    pub async fn recv(&mut self) -> InterruptSignal {
        poll_fn(|cx| self.poll_recv(cx)).await
    }

    /// Poll every subscription in order and report the first delivered signal.
    fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<InterruptSignal> {
        for (signal, subscription) in &mut self.subscriptions {
            // `None` means the signal driver is gone; treat the stream as silent.
            if let Poll::Ready(Some(())) = subscription.poll_recv(cx) {
                return Poll::Ready(*signal);
            }
        }
        Poll::Pending
    }
}

#[cfg(unix)]
fn subscribe(signal: InterruptSignal) -> std::io::Result<Subscription> {
    tokio::signal::unix::signal(signal.kind())
}

#[cfg(windows)]
fn subscribe(_signal: InterruptSignal) -> std::io::Result<Subscription> {
    tokio::signal::windows::ctrl_c()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_names_parse_in_several_spellings() {
        assert_eq!(
            "SIGINT".parse::<InterruptSignal>().unwrap(),
            InterruptSignal::Interrupt
        );
        assert_eq!(
            "ctrl-c".parse::<InterruptSignal>().unwrap(),
            InterruptSignal::Interrupt
        );
        assert_eq!(
            " term ".parse::<InterruptSignal>().unwrap(),
            InterruptSignal::Terminate
        );
        assert_eq!(
            "sigusr2".parse::<InterruptSignal>().unwrap(),
            InterruptSignal::User2
        );
    }

    #[test]
    fn test_display_parses_back() {
        for signal in InterruptSignal::ALL {
            assert_eq!(signal.to_string().parse::<InterruptSignal>().unwrap(), signal);
        }
    }

    #[test]
    fn test_unknown_signal_rejected() {
        let err = "SIGKILL".parse::<InterruptSignal>().unwrap_err();
        assert!(matches!(err, AppError::UnknownSignal(name) if name == "SIGKILL"));
    }

    #[test]
    fn test_default_set_is_interrupt_only() {
        let set = SignalSet::default();
        assert_eq!(set.len(), 1);
        assert!(set.contains(InterruptSignal::Interrupt));
    }

    #[test]
    fn test_platform_set_starts_with_interrupt() {
        let set = SignalSet::platform();
        assert_eq!(set.iter().next(), Some(InterruptSignal::Interrupt));
        #[cfg(unix)]
        assert!(set.contains(InterruptSignal::Terminate));
    }

    #[test]
    fn test_set_keeps_order_and_drops_duplicates() {
        let set: SignalSet = "SIGTERM, SIGINT,,sigterm,HUP".parse().unwrap();
        let signals: Vec<_> = set.iter().collect();

        assert_eq!(
            signals,
            vec![
                InterruptSignal::Terminate,
                InterruptSignal::Interrupt,
                InterruptSignal::Hangup,
            ]
        );
        assert_eq!(set.to_string(), "SIGTERM,SIGINT,SIGHUP");
    }

    #[test]
    fn test_set_parse_fails_on_any_unknown_name() {
        assert!("SIGINT,SIGNOPE".parse::<SignalSet>().is_err());
    }

    #[test]
    fn test_empty_string_gives_empty_set() {
        let set: SignalSet = " , ".parse().unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_interrupt_always_supported() {
        assert!(InterruptSignal::Interrupt.is_supported());
        assert_eq!(SignalSet::default().first_unsupported(), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_register_reports_subscribed_signals() {
        let set = SignalSet::new([InterruptSignal::User1, InterruptSignal::Hangup]);
        let listener = SignalListener::register(&set).unwrap();
        assert_eq!(listener.signals(), set);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_empty_listener_stays_pending() {
        let mut listener = SignalListener::register(&SignalSet::new(Vec::new())).unwrap();
        let result =
            tokio::time::timeout(std::time::Duration::from_millis(20), listener.recv()).await;
        assert!(result.is_err());
    }
}
