use std::sync::Arc;
use tokio::sync::broadcast;

/// Bounded broadcast topic carrying events from async producers (stdin) to
/// the control thread. A slow consumer loses the oldest messages, never blocks
/// a producer.
#[derive(Debug, Clone)]
pub struct Topic<T> {
    tx: broadcast::Sender<Arc<T>>,
}

impl<T: Send + Sync + 'static> Topic<T> {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publishes `msg`; returns `false` if nobody is subscribed.
    pub fn publish(&self, msg: T) -> bool {
        self.tx.send(Arc::new(msg)).is_ok()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<T>> {
        self.tx.subscribe()
    }
}
