use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{LiveError, Signal};

use super::{SignalBus, TopicHandle, TOPIC_CAPACITY};

/// A frame relayed between sockets on one topic. The relay does not decode
/// signal payloads; it only tags frames with the publishing connection so it
/// can avoid echoing them back over the network (clients loop back locally).
#[derive(Clone, Debug)]
pub struct RelayFrame {
    pub sender_id: String,
    pub content: String,
}

/// Server-side topic fan-out for the networked signal bus. One broadcast
/// channel per session id; sockets come and go with their subscriptions.
#[derive(Default)]
pub struct RelayState {
    topics: RwLock<HashMap<String, broadcast::Sender<RelayFrame>>>,
}

impl RelayState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn topic_count(&self) -> usize {
        let topics = self.topics.read().await;
        topics.values().filter(|tx| tx.receiver_count() > 0).count()
    }

    pub async fn subscriber_count(&self) -> usize {
        let topics = self.topics.read().await;
        topics.values().map(|tx| tx.receiver_count()).sum()
    }

    async fn channel(&self, session_id: &str) -> broadcast::Sender<RelayFrame> {
        let mut topics = self.topics.write().await;
        topics.retain(|_, tx| tx.receiver_count() > 0);
        topics
            .entry(session_id.to_string())
            .or_insert_with(|| {
                let (tx, _rx) = broadcast::channel::<RelayFrame>(TOPIC_CAPACITY);
                tx
            })
            .clone()
    }
}

/// The relay is itself a `SignalBus`: `open` bridges a signal channel pair
/// onto the topic's frame channel, with its own publisher id for echo
/// suppression. Server-side publishers (the lifecycle controller's
/// END_SESSION broadcast) therefore reach the same sockets as every
/// relay-connected observer.
impl SignalBus for RelayState {
    fn open<'a>(
        &'a self,
        topic: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<TopicHandle, LiveError>> + Send + 'a>> {
        Box::pin(async move {
            let publisher_id = Uuid::new_v4().to_string();
            let bc = self.channel(topic).await;
            let mut rbc = bc.subscribe();

            let (out_tx, mut out_rx) = broadcast::channel::<Signal>(TOPIC_CAPACITY);
            let (deliver_tx, deliver_rx) = broadcast::channel::<Signal>(TOPIC_CAPACITY);

            let shuttle_topic = topic.to_string();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        outgoing = out_rx.recv() => match outgoing {
                            Ok(signal) => {
                                // Local loop-back first, then the frame for
                                // everyone else on the topic.
                                let _ = deliver_tx.send(signal.clone());
                                let Some(text) = signal.encode() else { continue };
                                let _ = bc.send(RelayFrame {
                                    sender_id: publisher_id.clone(),
                                    content: text,
                                });
                            }
                            // All handles dropped: unsubscribe. Buffered
                            // sends drain before Closed is surfaced.
                            Err(broadcast::error::RecvError::Closed) => break,
                            Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        },
                        incoming = rbc.recv() => match incoming {
                            Ok(frame) => {
                                if frame.sender_id == publisher_id {
                                    continue;
                                }
                                if let Some(signal) = Signal::decode(&frame.content) {
                                    let _ = deliver_tx.send(signal);
                                }
                            }
                            Err(broadcast::error::RecvError::Lagged(_)) => continue,
                            Err(broadcast::error::RecvError::Closed) => break,
                        },
                    }
                }
                debug!("Relay publisher shuttle for session {} exiting", shuttle_topic);
            });

            Ok(TopicHandle::new(topic.to_string(), out_tx, deliver_rx))
        })
    }
}

/// WebSocket entry point for one session topic.
pub async fn relay_handler(
    Path(session_id): Path<String>,
    ws: WebSocketUpgrade,
    State(state): State<Arc<RelayState>>,
) -> Response {
    info!("New relay connection attempt for session {}", session_id);
    ws.on_upgrade(move |socket| handle_socket(socket, session_id, state))
}

/// Shuttle frames between one socket and the topic's broadcast channel.
async fn handle_socket(socket: WebSocket, session_id: String, state: Arc<RelayState>) {
    // Identifies this client so its own frames are not echoed back to it.
    let connection_id = Uuid::new_v4().to_string();
    info!(
        "Relay connection established for session {} (connection {})",
        session_id, connection_id
    );

    let (sender, mut receiver) = socket.split();
    let sender = Arc::new(tokio::sync::Mutex::new(sender));

    let bc = state.channel(&session_id).await;
    let mut rbc = bc.subscribe();

    // Inbound: socket -> topic.
    let inbound_id = connection_id.clone();
    let inbound_session = session_id.clone();
    let mut inbound_task = tokio::spawn(async move {
        while let Some(Ok(Message::Text(frame))) = receiver.next().await {
            debug!("Relaying frame on session {}: {}", inbound_session, frame);
            let _ = bc.send(RelayFrame {
                sender_id: inbound_id.clone(),
                content: frame,
            });
        }
    });

    // Outbound: topic -> socket, skipping this connection's own frames.
    let outbound_id = connection_id.clone();
    let outbound_sender = sender.clone();
    let mut outbound_task = tokio::spawn(async move {
        loop {
            match rbc.recv().await {
                Ok(frame) => {
                    if frame.sender_id == outbound_id {
                        continue;
                    }
                    let mut socket = outbound_sender.lock().await;
                    if socket.send(Message::Text(frame.content)).await.is_err() {
                        break;
                    }
                }
                // At-most-once transport: frames lost to lag stay lost.
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    tokio::select! {
        _ = (&mut inbound_task) => outbound_task.abort(),
        _ = (&mut outbound_task) => inbound_task.abort(),
    };
    info!(
        "Relay connection closed for session {} (connection {})",
        session_id, connection_id
    );
}
