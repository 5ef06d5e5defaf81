use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use tokio::sync::broadcast;
use tracing::debug;

use crate::models::{LiveError, Signal};

use super::{SignalBus, TopicHandle, TOPIC_CAPACITY};

/// In-process signal bus: one broadcast channel per topic, shared by every
/// observer in the same process. This is the single-machine, multi-client
/// simulation backend; the relay-backed bus covers real deployments.
#[derive(Default)]
pub struct LocalSignalBus {
    topics: Mutex<HashMap<String, broadcast::Sender<Signal>>>,
}

impl LocalSignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Topics with at least one live subscriber.
    pub fn topic_count(&self) -> usize {
        let topics = self.topics.lock().unwrap();
        topics.values().filter(|tx| tx.receiver_count() > 0).count()
    }

    pub fn subscriber_count(&self) -> usize {
        let topics = self.topics.lock().unwrap();
        topics.values().map(|tx| tx.receiver_count()).sum()
    }
}

impl SignalBus for LocalSignalBus {
    fn open<'a>(
        &'a self,
        topic: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<TopicHandle, LiveError>> + Send + 'a>> {
        Box::pin(async move {
            let mut topics = self.topics.lock().unwrap();
            // Drop channels every subscriber has left; a fresh open after
            // that is indistinguishable from a new topic (no backlog).
            topics.retain(|_, tx| tx.receiver_count() > 0);

            let tx = topics
                .entry(topic.to_string())
                .or_insert_with(|| {
                    debug!("Opening local signal topic '{}'", topic);
                    let (tx, _rx) = broadcast::channel::<Signal>(TOPIC_CAPACITY);
                    tx
                })
                .clone();

            // Subscribing the handle's own receiver off the shared sender is
            // what produces loop-back delivery of the observer's own sends.
            let rx = tx.subscribe();
            Ok(TopicHandle::new(topic.to_string(), tx, rx))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Signal;

    #[tokio::test]
    async fn delivers_to_all_subscribers_including_sender() {
        let bus = LocalSignalBus::new();
        let mut a = bus.open("s-1").await.unwrap();
        let mut b = bus.open("s-1").await.unwrap();

        a.send(&Signal::SyncReq("u-a".to_string()));

        assert_eq!(a.recv().await, Some(Signal::SyncReq("u-a".to_string())));
        assert_eq!(b.recv().await, Some(Signal::SyncReq("u-a".to_string())));
    }

    #[tokio::test]
    async fn topics_are_isolated() {
        let bus = LocalSignalBus::new();
        let a = bus.open("s-1").await.unwrap();
        let mut c = bus.open("s-2").await.unwrap();

        a.send(&Signal::SyncReq("u-a".to_string()));
        c.send(&Signal::Leave("u-c".to_string()));

        // The only signal on s-2 is its own.
        assert_eq!(c.recv().await, Some(Signal::Leave("u-c".to_string())));
    }

    #[tokio::test]
    async fn send_without_subscribers_is_a_noop() {
        let bus = LocalSignalBus::new();
        let handle = bus.open("s-1").await.unwrap();
        let (sender, receiver) = handle.split();
        drop(receiver);

        // Nobody is subscribed any more; this must not panic or error.
        sender.send(&Signal::EndSession {});
    }

    #[tokio::test]
    async fn no_backlog_for_late_subscribers() {
        let bus = LocalSignalBus::new();
        let a = bus.open("s-1").await.unwrap();
        a.send(&Signal::SyncReq("u-a".to_string()));

        let mut b = bus.open("s-1").await.unwrap();
        a.send(&Signal::Leave("u-a".to_string()));

        // B only sees what was sent after it subscribed.
        assert_eq!(b.recv().await, Some(Signal::Leave("u-a".to_string())));
    }
}
