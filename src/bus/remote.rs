use std::future::Future;
use std::pin::Pin;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info};

use crate::models::{LiveError, Signal};

use super::{SignalBus, TopicHandle, TOPIC_CAPACITY};

/// Networked signal bus backed by the relay endpoint. Opens one WebSocket
/// per topic; the relay fans frames out to every other subscriber, and
/// loop-back delivery of the observer's own sends happens locally.
pub struct RemoteSignalBus {
    base_url: String,
}

impl RemoteSignalBus {
    /// `base_url` without a trailing slash, e.g. `ws://127.0.0.1:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    fn topic_url(&self, topic: &str) -> String {
        format!("{}/ws/sessions/{}", self.base_url, topic)
    }
}

impl SignalBus for RemoteSignalBus {
    fn open<'a>(
        &'a self,
        topic: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<TopicHandle, LiveError>> + Send + 'a>> {
        Box::pin(async move {
            let url = self.topic_url(topic);
            let (stream, _response) = connect_async(url.as_str()).await.map_err(|e| {
                error!("Failed to open relay topic '{}': {}", url, e);
                LiveError::TransportUnavailable(e.to_string())
            })?;
            info!("Opened relay topic '{}'", url);

            let (mut sink, mut source) = stream.split();

            // Publish side: callers write here, the shuttle task forwards to
            // the relay and loops the frame back into the delivery channel.
            let (out_tx, mut out_rx) = broadcast::channel::<Signal>(TOPIC_CAPACITY);
            // Delivery side: everything the observer should see, own sends
            // included.
            let (deliver_tx, deliver_rx) = broadcast::channel::<Signal>(TOPIC_CAPACITY);

            let shuttle_topic = topic.to_string();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        outgoing = out_rx.recv() => match outgoing {
                            Ok(signal) => {
                                // Local loop-back before the network send, so
                                // a dropped connection still delivers our own
                                // frame to ourselves at most once.
                                let _ = deliver_tx.send(signal.clone());
                                let Some(text) = signal.encode() else { continue };
                                if sink.send(WsMessage::Text(text.into())).await.is_err() {
                                    break;
                                }
                            }
                            // All handles dropped: unsubscribe.
                            Err(broadcast::error::RecvError::Closed) => {
                                let _ = sink.send(WsMessage::Close(None)).await;
                                break;
                            }
                            Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        },
                        incoming = source.next() => match incoming {
                            Some(Ok(WsMessage::Text(frame))) => {
                                if let Some(signal) = Signal::decode(frame.as_str()) {
                                    let _ = deliver_tx.send(signal);
                                }
                            }
                            Some(Ok(WsMessage::Close(_))) | None => break,
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                debug!("Relay socket error on '{}': {}", shuttle_topic, e);
                                break;
                            }
                        },
                    }
                }
                debug!("Relay shuttle for topic '{}' exiting", shuttle_topic);
            });

            Ok(TopicHandle::new(topic.to_string(), out_tx, deliver_rx))
        })
    }
}
