use std::future::Future;
use std::pin::Pin;

use tokio::sync::broadcast;
use tracing::warn;

use crate::models::{LiveError, Signal};

pub mod local;
pub mod relay;
pub mod remote;

/// Buffered frames per topic before slow subscribers start losing messages.
/// Losses are within the transport contract (at-most-once, best-effort).
pub const TOPIC_CAPACITY: usize = 256;

/// Topic-scoped pub/sub transport. Implementations must deliver every send
/// back to the sender as well (loop-back), guarantee at most one delivery
/// per subscriber per send, and keep no backlog for late subscribers.
///
/// A send to a topic nobody currently subscribes to is a silent no-op.
pub trait SignalBus: Send + Sync {
    fn open<'a>(
        &'a self,
        topic: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<TopicHandle, LiveError>> + Send + 'a>>;
}

/// Subscription to one topic: a publish side and a delivery side. Dropping
/// the handle (or both halves after `split`) unsubscribes and releases the
/// underlying transport resources.
pub struct TopicHandle {
    topic: String,
    tx: broadcast::Sender<Signal>,
    rx: broadcast::Receiver<Signal>,
}

impl TopicHandle {
    pub(crate) fn new(
        topic: String,
        tx: broadcast::Sender<Signal>,
        rx: broadcast::Receiver<Signal>,
    ) -> Self {
        Self { topic, tx, rx }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Fire-and-forget broadcast to all current subscribers of the topic.
    pub fn send(&self, signal: &Signal) {
        let _ = self.tx.send(signal.clone());
    }

    pub async fn recv(&mut self) -> Option<Signal> {
        recv_skipping_lagged(&mut self.rx, &self.topic).await
    }

    /// Split into an independently clonable publish side and the single
    /// delivery side, so a message pump can own reception while callers
    /// keep sending.
    pub fn split(self) -> (TopicSender, TopicReceiver) {
        (
            TopicSender { topic: self.topic.clone(), tx: self.tx },
            TopicReceiver { topic: self.topic, rx: self.rx },
        )
    }
}

/// Publish half of a topic subscription.
#[derive(Clone)]
pub struct TopicSender {
    topic: String,
    tx: broadcast::Sender<Signal>,
}

impl TopicSender {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn send(&self, signal: &Signal) {
        // An Err here means zero current subscribers, which the transport
        // contract defines as a no-op rather than a failure.
        let _ = self.tx.send(signal.clone());
    }
}

/// Delivery half of a topic subscription.
pub struct TopicReceiver {
    topic: String,
    rx: broadcast::Receiver<Signal>,
}

impl TopicReceiver {
    pub async fn recv(&mut self) -> Option<Signal> {
        recv_skipping_lagged(&mut self.rx, &self.topic).await
    }
}

async fn recv_skipping_lagged(
    rx: &mut broadcast::Receiver<Signal>,
    topic: &str,
) -> Option<Signal> {
    loop {
        match rx.recv().await {
            Ok(signal) => return Some(signal),
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!("Subscriber on topic '{}' lagged, {} signals lost", topic, missed);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}
