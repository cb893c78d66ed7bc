//! Broadcast feed for the shutdown event.

use tokio::sync::broadcast::{self, error::RecvError};

/// Only one event is ever published, so one slot is enough.
const FEED_CAPACITY: usize = 1;

/// Publish/subscribe feed that carries the shutdown event.
///
/// Each subscriber registered before the event gets its own delivery.
/// Subscribers registered afterwards get nothing; there is no replay.
#[derive(Debug, Clone)]
pub struct InterruptFeed {
    tx: broadcast::Sender<()>,
}

impl InterruptFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self { tx }
    }

    /// Register a new subscriber.
    pub fn subscribe(&self) -> InterruptSubscription {
        InterruptSubscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Deliver the event to current subscribers and return how many there were.
    pub(crate) fn publish(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }
}

impl Default for InterruptFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscriber side of an [`InterruptFeed`].
#[derive(Debug)]
pub struct InterruptSubscription {
    rx: broadcast::Receiver<()>,
}

impl InterruptSubscription {
    /// Wait for the shutdown event.
    ///
    /// Returns `None` if the feed was dropped without publishing.
    pub async fn recv(&mut self) -> Option<()> {
        loop {
            match self.rx.recv().await {
                Ok(()) => return Some(()),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking receive. `Some(())` if an undelivered event is waiting.
    pub fn try_recv(&mut self) -> Option<()> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[test]
    fn test_publish_without_subscribers_is_harmless() {
        let feed = InterruptFeed::default();
        assert_eq!(feed.publish(), 0);
    }

    #[test]
    fn test_each_subscriber_gets_its_own_delivery() {
        let feed = InterruptFeed::default();
        let mut first = feed.subscribe();
        let mut second = feed.subscribe();

        assert_eq!(feed.publish(), 2);

        assert_eq!(first.try_recv(), Some(()));
        assert_eq!(second.try_recv(), Some(()));
        assert_eq!(first.try_recv(), None);
    }

    #[test]
    fn test_late_subscriber_gets_no_replay() {
        let feed = InterruptFeed::default();
        feed.publish();

        let mut late = feed.subscribe();
        assert_eq!(late.try_recv(), None);
    }

    #[test]
    fn test_single_slot_reaches_every_subscriber() {
        let feed = InterruptFeed::new();
        let mut subs: Vec<_> = (0..64).map(|_| feed.subscribe()).collect();

        assert_eq!(feed.publish(), 64);

        for sub in &mut subs {
            assert_eq!(sub.try_recv(), Some(()));
            assert_eq!(sub.try_recv(), None);
        }
    }

    #[tokio::test]
    async fn test_recv_returns_none_when_feed_dropped() {
        let feed = InterruptFeed::default();
        let mut sub = feed.subscribe();
        drop(feed);

        let result = timeout(Duration::from_millis(50), sub.recv()).await.unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_subscriber_count_tracks_drops() {
        let feed = InterruptFeed::default();
        let sub = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 1);
        drop(sub);
        assert_eq!(feed.subscriber_count(), 0);
    }
}
