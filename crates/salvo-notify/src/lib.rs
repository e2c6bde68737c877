//! Subscriber lists for Salvo notifications.
//!
//! Every notification category (state changes, lobby changes, chat,
//! errors, discovered servers, ...) owns one [`Subscribers`] list. A
//! subscriber receives values through its own unbounded channel, so the
//! publishing side (the client actor or the discovery loop) never calls
//! into subscriber code directly: the hand-off across tasks is always an
//! explicit channel send.
//!
//! Delivery order follows registration order. No other ordering is
//! promised, neither across subscribers nor across categories.

use std::fmt;

use tokio::sync::mpsc;

/// Identifies one subscription inside its list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// The receiving end of a subscription.
///
/// Dropping it unsubscribes lazily: the list prunes the entry on its next
/// publish.
#[derive(Debug)]
pub struct Subscription<T> {
    id: SubscriptionId,
    receiver: mpsc::UnboundedReceiver<T>,
}

impl<T> Subscription<T> {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Waits for the next value. Returns `None` once the publishing side
    /// is gone and the queue is drained.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    /// Returns the next queued value without waiting.
    pub fn try_recv(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// Takes every value queued so far.
    pub fn drain(&mut self) -> Vec<T> {
        let mut values = Vec::new();
        while let Some(value) = self.try_recv() {
            values.push(value);
        }
        values
    }
}

/// An append-only list of subscribers for one notification category.
pub struct Subscribers<T> {
    next_id: u64,
    entries: Vec<(SubscriptionId, mpsc::UnboundedSender<T>)>,
}

impl<T: Clone> Subscribers<T> {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            entries: Vec::new(),
        }
    }

    /// Registers a new subscriber at the end of the list.
    pub fn subscribe(&mut self) -> Subscription<T> {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        let (sender, receiver) = mpsc::unbounded_channel();
        self.entries.push((id, sender));
        tracing::trace!(%id, subscribers = self.entries.len(), "subscriber added");

        Subscription { id, receiver }
    }

    /// Removes a subscriber. Returns `false` if it was not registered
    /// (or was already pruned).
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        before != self.entries.len()
    }

    /// Delivers `value` to every live subscriber in registration order and
    /// prunes subscribers whose receiver was dropped.
    ///
    /// Returns the number of subscribers that received the value.
    pub fn publish(&mut self, value: T) -> usize {
        self.entries.retain(|(id, sender)| {
            let alive = sender.send(value.clone()).is_ok();
            if !alive {
                tracing::trace!(%id, "pruning closed subscriber");
            }
            alive
        });
        self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone> Default for Subscribers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Subscribers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let mut list = Subscribers::new();
        let mut a = list.subscribe();
        let mut b = list.subscribe();

        assert_eq!(list.publish("hello"), 2);

        assert_eq!(a.try_recv(), Some("hello"));
        assert_eq!(b.try_recv(), Some("hello"));
    }

    #[test]
    fn test_subscription_ids_are_unique() {
        let mut list = Subscribers::<u8>::new();
        let a = list.subscribe();
        let b = list.subscribe();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut list = Subscribers::new();
        let mut a = list.subscribe();
        let mut b = list.subscribe();

        assert!(list.unsubscribe(a.id()));
        assert!(!list.unsubscribe(a.id()), "second removal is a no-op");

        list.publish(7);
        assert_eq!(a.try_recv(), None);
        assert_eq!(b.try_recv(), Some(7));
    }

    #[test]
    fn test_dropped_receiver_is_pruned_on_publish() {
        let mut list = Subscribers::new();
        let keep = list.subscribe();
        let gone = list.subscribe();
        drop(gone);

        assert_eq!(list.publish(1), 1);
        assert_eq!(list.len(), 1);
        drop(keep);
    }

    #[test]
    fn test_drain_returns_values_in_publish_order() {
        let mut list = Subscribers::new();
        let mut sub = list.subscribe();
        for i in 0..3 {
            list.publish(i);
        }
        assert_eq!(sub.drain(), vec![0, 1, 2]);
        assert!(sub.drain().is_empty());
    }

    #[tokio::test]
    async fn test_recv_returns_none_after_list_dropped() {
        let mut list = Subscribers::new();
        let mut sub = list.subscribe();
        list.publish("last");
        drop(list);

        assert_eq!(sub.recv().await, Some("last"));
        assert_eq!(sub.recv().await, None);
    }
}
