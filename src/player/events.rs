use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::warn;

const CAPACITY: usize = 64;

/// Fan-out channel: every live [`Subscription`] receives every published value.
#[derive(Debug, Clone)]
pub struct EventBus<T: Clone> {
    tx: broadcast::Sender<T>,
}

impl<T: Clone> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> EventBus<T> {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CAPACITY);
        Self { tx }
    }

    /// Returns how many subscribers the value was delivered to.
    pub fn publish(&self, value: T) -> usize {
        self.tx.send(value).unwrap_or(0)
    }

    pub fn subscribe(&self) -> Subscription<T> {
        Subscription {
            rx: Some(self.tx.subscribe()),
        }
    }
}

/// Disposable handle on an [`EventBus`].
#[derive(Debug)]
pub struct Subscription<T: Clone> {
    rx: Option<broadcast::Receiver<T>>,
}

impl<T: Clone> Subscription<T> {
    pub fn is_active(&self) -> bool {
        self.rx.is_some()
    }

    /// Stops delivery. Calling it again does nothing.
    pub fn unsubscribe(&mut self) {
        self.rx = None;
    }

    /// Next value already published, without blocking.
    pub fn try_next(&mut self) -> Option<T> {
        let rx = self.rx.as_mut()?;
        loop {
            match rx.try_recv() {
                Ok(value) => return Some(value),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Subscriber lagged, {} events dropped", skipped);
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Closed) => {
                    self.rx = None;
                    return None;
                }
            }
        }
    }

    pub fn drain(&mut self) -> Vec<T> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    pub async fn next(&mut self) -> Option<T> {
        let rx = self.rx.as_mut()?;
        loop {
            match rx.recv().await {
                Ok(value) => return Some(value),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Subscriber lagged, {} events dropped", skipped);
                }
                Err(RecvError::Closed) => {
                    self.rx = None;
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subscriber_receives_each_value() {
        let bus = EventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        assert_eq!(bus.publish(7), 2);
        assert_eq!(a.try_next(), Some(7));
        assert_eq!(b.try_next(), Some(7));
        assert_eq!(a.try_next(), None);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();

        sub.unsubscribe();
        sub.unsubscribe();

        assert!(!sub.is_active());
        assert_eq!(bus.publish(1), 0);
        assert_eq!(sub.try_next(), None);
    }

    #[test]
    fn values_published_before_subscribing_are_not_seen() {
        let bus = EventBus::new();
        bus.publish("early");
        let mut sub = bus.subscribe();
        bus.publish("late");
        assert_eq!(sub.drain(), vec!["late"]);
    }

    #[tokio::test]
    async fn closed_bus_ends_the_stream() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();
        bus.publish(1);
        drop(bus);

        assert_eq!(sub.next().await, Some(1));
        assert_eq!(sub.next().await, None);
        assert!(!sub.is_active());
    }
}
