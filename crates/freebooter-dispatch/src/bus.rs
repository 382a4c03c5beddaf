//! A typed publish/subscribe bus.
//!
//! Events are a closed enum implementing [`Event`]. Each event reports its
//! [`Kind`](Event::Kind), and subscribers say up front which kinds they
//! want. Delivery goes through one unbounded channel per subscription, so
//! a subscriber sees the kinds it asked for in publish order.
//!
//! Publishing never runs subscriber code. Subscribers pull events out of
//! their [`Subscription`] when they are ready, which lets the owner of
//! game state apply them at a fixed point in the tick.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

/// Something that can travel on an [`EventBus`].
pub trait Event: Clone + Send + 'static {
    /// Discriminant used for subscription filtering.
    type Kind: Copy + Eq + Hash + fmt::Debug + Send + 'static;

    fn kind(&self) -> Self::Kind;
}

type Subscribers<E> = HashMap<<E as Event>::Kind, Vec<mpsc::UnboundedSender<E>>>;

/// Per-kind fan-out of events. Cloning shares the same subscriber table.
pub struct EventBus<E: Event> {
    subscribers: Arc<Mutex<Subscribers<E>>>,
}

impl<E: Event> EventBus<E> {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Registers interest in `kinds`.
    ///
    /// Events published after this call with one of those kinds are
    /// delivered to the returned subscription.
    pub fn subscribe(&self, kinds: &[E::Kind]) -> Subscription<E> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = self.lock();
        for kind in kinds {
            subscribers.entry(*kind).or_default().push(tx.clone());
        }
        tracing::debug!(?kinds, "event subscription added");
        Subscription { rx }
    }

    /// Delivers `event` to every live subscriber of its kind.
    ///
    /// Returns the number of subscriptions that received it. Dropped
    /// subscriptions are pruned here.
    pub fn publish(&self, event: E) -> usize {
        let kind = event.kind();
        let mut subscribers = self.lock();
        let Some(senders) = subscribers.get_mut(&kind) else {
            tracing::trace!(?kind, "event published with no subscribers");
            return 0;
        };

        senders.retain(|tx| !tx.is_closed());
        senders
            .iter()
            .filter(|tx| tx.send(event.clone()).is_ok())
            .count()
    }

    /// Live subscriptions for `kind`.
    pub fn subscriber_count(&self, kind: E::Kind) -> usize {
        self.lock()
            .get(&kind)
            .map_or(0, |senders| senders.iter().filter(|tx| !tx.is_closed()).count())
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers<E>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: Event> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            subscribers: Arc::clone(&self.subscribers),
        }
    }
}

impl<E: Event> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("kinds", &self.lock().len())
            .finish()
    }
}

/// The receiving end of [`EventBus::subscribe`].
///
/// Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription<E> {
    rx: mpsc::UnboundedReceiver<E>,
}

impl<E> Subscription<E> {
    /// Takes the next pending event without waiting.
    pub fn try_next(&mut self) -> Option<E> {
        self.rx.try_recv().ok()
    }

    /// Takes every pending event.
    pub fn drain(&mut self) -> Vec<E> {
        let mut events = Vec::new();
        while let Some(event) = self.try_next() {
            events.push(event);
        }
        events
    }

    /// Waits for the next event. Returns `None` once every bus handle is
    /// gone.
    pub async fn recv(&mut self) -> Option<E> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Ping {
        Hello(u32),
        Bye(u32),
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum PingKind {
        Hello,
        Bye,
    }

    impl Event for Ping {
        type Kind = PingKind;

        fn kind(&self) -> PingKind {
            match self {
                Ping::Hello(_) => PingKind::Hello,
                Ping::Bye(_) => PingKind::Bye,
            }
        }
    }

    #[test]
    fn test_publish_without_subscribers_returns_zero() {
        let bus = EventBus::<Ping>::new();
        assert_eq!(bus.publish(Ping::Hello(1)), 0);
    }

    #[test]
    fn test_subscriber_only_sees_requested_kinds() {
        let bus = EventBus::new();
        let mut hellos = bus.subscribe(&[PingKind::Hello]);

        bus.publish(Ping::Bye(1));
        bus.publish(Ping::Hello(2));

        assert_eq!(hellos.drain(), vec![Ping::Hello(2)]);
    }

    #[test]
    fn test_multi_kind_subscription_keeps_publish_order() {
        let bus = EventBus::new();
        let mut both = bus.subscribe(&[PingKind::Hello, PingKind::Bye]);

        bus.publish(Ping::Hello(1));
        bus.publish(Ping::Bye(1));
        bus.publish(Ping::Hello(2));

        assert_eq!(
            both.drain(),
            vec![Ping::Hello(1), Ping::Bye(1), Ping::Hello(2)]
        );
    }

    #[test]
    fn test_every_subscriber_receives_a_copy() {
        let bus = EventBus::new();
        let mut a = bus.subscribe(&[PingKind::Hello]);
        let mut b = bus.subscribe(&[PingKind::Hello]);

        assert_eq!(bus.publish(Ping::Hello(9)), 2);
        assert_eq!(a.try_next(), Some(Ping::Hello(9)));
        assert_eq!(b.try_next(), Some(Ping::Hello(9)));
    }

    #[test]
    fn test_dropped_subscription_is_pruned() {
        let bus = EventBus::new();
        let kept = bus.subscribe(&[PingKind::Bye]);
        drop(bus.subscribe(&[PingKind::Bye]));

        assert_eq!(bus.publish(Ping::Bye(3)), 1);
        assert_eq!(bus.subscriber_count(PingKind::Bye), 1);
        drop(kept);
    }

    #[test]
    fn test_clone_shares_subscribers() {
        let bus = EventBus::new();
        let publisher = bus.clone();
        let mut sub = bus.subscribe(&[PingKind::Hello]);

        publisher.publish(Ping::Hello(5));
        assert_eq!(sub.try_next(), Some(Ping::Hello(5)));
    }

    #[tokio::test]
    async fn test_recv_waits_for_event() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe(&[PingKind::Hello]);

        let publisher = bus.clone();
        tokio::spawn(async move {
            publisher.publish(Ping::Hello(42));
        });

        assert_eq!(sub.recv().await, Some(Ping::Hello(42)));
    }
}
