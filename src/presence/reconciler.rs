use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::bus::{SignalBus, TopicSender};
use crate::models::{
    LiveError, LiveMessage, LiveParticipant, LiveSession, Signal, StatusPatch, StatusUpdate, User,
};
use crate::utils::scope_guard::ScopeGuard;

use super::chat::ChatRelay;
use super::media::{LocalMedia, MediaDevices};
use super::status_store::ParticipantStatusStore;

/// Where this observer is in its room lifecycle. `Left` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    Joining,
    Active,
    Left,
}

/// Notifications surfaced to the embedding application so it can render.
#[derive(Debug, Clone)]
pub enum RoomEvent {
    ParticipantJoined(LiveParticipant),
    ParticipantLeft(String),
    StatusChanged { id: String, updates: StatusUpdate },
    ChatReceived(LiveMessage),
    SessionEnded,
}

/// Everything the pump task and the handle mutate, behind one lock so reply
/// generation always reads the same membership the handlers write.
struct RoomState {
    store: ParticipantStatusStore,
    chat: ChatRelay,
    phase: RoomPhase,
    media: Option<LocalMedia>,
}

/// Signal application logic, shared between the pump task and tests.
#[derive(Clone)]
struct ReconcilerCore {
    session_id: String,
    user_id: String,
    state: Arc<Mutex<RoomState>>,
    sender: TopicSender,
    events: mpsc::UnboundedSender<RoomEvent>,
}

impl ReconcilerCore {
    /// Our own record as the store currently holds it. Replies must read
    /// this live value, never a copy captured at subscription time, or
    /// concurrently joining peers can miss each other.
    fn current_record(&self) -> Option<LiveParticipant> {
        let state = self.state.lock().unwrap();
        state.store.get(&self.user_id).cloned()
    }

    /// Apply one delivered signal. Returns false when the room is over and
    /// the pump should stop. Own loop-back echoes are tolerated throughout.
    fn apply(&self, signal: Signal) -> bool {
        match signal {
            Signal::Join(record) => {
                if record.id == self.user_id || record.session_id != self.session_id {
                    return true;
                }
                let inserted = {
                    let mut state = self.state.lock().unwrap();
                    state.store.upsert(record.clone())
                };
                if inserted {
                    let _ = self.events.send(RoomEvent::ParticipantJoined(record));
                }
                // Reply unconditionally so the new arrival learns about us
                // even if it subscribed after our own JOIN went out.
                if let Some(me) = self.current_record() {
                    self.sender.send(&Signal::SyncRes(me));
                }
                true
            }
            Signal::SyncReq(requester) => {
                if requester != self.user_id {
                    if let Some(me) = self.current_record() {
                        self.sender.send(&Signal::SyncRes(me));
                    }
                }
                true
            }
            Signal::SyncRes(record) => {
                if record.id == self.user_id {
                    return true;
                }
                let inserted = {
                    let mut state = self.state.lock().unwrap();
                    state.store.upsert(record.clone())
                };
                if inserted {
                    let _ = self.events.send(RoomEvent::ParticipantJoined(record));
                }
                true
            }
            Signal::UpdateStatus(patch) => {
                let merged = {
                    let mut state = self.state.lock().unwrap();
                    state.store.merge(&patch.id, &patch.updates)
                };
                // Unknown ids are protocol noise, not errors. Our own echo
                // merges idempotently but is not re-announced.
                if merged && patch.id != self.user_id {
                    let _ = self.events.send(RoomEvent::StatusChanged {
                        id: patch.id,
                        updates: patch.updates,
                    });
                }
                true
            }
            Signal::Chat(message) => {
                let accepted = {
                    let mut state = self.state.lock().unwrap();
                    state.chat.accept(message.clone())
                };
                if accepted {
                    let _ = self.events.send(RoomEvent::ChatReceived(message));
                }
                true
            }
            Signal::Leave(id) => {
                if id == self.user_id {
                    return true;
                }
                let removed = {
                    let mut state = self.state.lock().unwrap();
                    state.store.remove(&id).is_some()
                };
                if removed {
                    let _ = self.events.send(RoomEvent::ParticipantLeft(id));
                }
                true
            }
            Signal::EndSession {} => {
                let mut state = self.state.lock().unwrap();
                if state.phase == RoomPhase::Left {
                    return false;
                }
                state.phase = RoomPhase::Left;
                if let Some(media) = state.media.take() {
                    media.stop();
                }
                drop(state);
                info!("Session {} ended by host broadcast", self.session_id);
                let _ = self.events.send(RoomEvent::SessionEnded);
                false
            }
        }
    }
}

/// One observer's connection to a live room: announces presence, converges
/// membership with its peers, relays chat, and honors the host's
/// termination broadcast.
pub struct PresenceReconciler;

impl PresenceReconciler {
    /// Join a live session. Binds a topic subscription, announces arrival,
    /// and requests backfill from whoever is already there.
    ///
    /// Media denial downgrades the join to muted/camera-off instead of
    /// failing it; an unreachable bus fails it.
    pub async fn join(
        session: &LiveSession,
        user: &User,
        bus: &dyn SignalBus,
        media: Arc<dyn MediaDevices>,
    ) -> Result<RoomHandle, LiveError> {
        if !session.is_live() {
            return Err(LiveError::InvalidTransition {
                from: session.status,
                attempted: "join",
            });
        }
        if session.is_locked && !session.is_host(&user.id) {
            return Err(LiveError::Unauthorized(format!(
                "session '{}' is locked",
                session.id
            )));
        }

        let (local_media, muted, camera_off) = match media.acquire_camera().await {
            Ok(stream) => (Some(stream), false, false),
            Err(e) => {
                warn!("Joining session {} without media: {}", session.id, e);
                (None, true, true)
            }
        };

        let topic = bus.open(&session.id).await?;
        let (sender, mut receiver) = topic.split();

        let me = LiveParticipant::on_join(user, &session.id, muted, camera_off);
        let state = Arc::new(Mutex::new(RoomState {
            store: ParticipantStatusStore::new(),
            chat: ChatRelay::new(),
            phase: RoomPhase::Joining,
            media: local_media,
        }));
        {
            let mut st = state.lock().unwrap();
            st.store.upsert(me.clone());
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let core = ReconcilerCore {
            session_id: session.id.clone(),
            user_id: user.id.clone(),
            state: state.clone(),
            sender: sender.clone(),
            events: events_tx,
        };

        // Announce and ask for backfill. The subscription already exists,
        // so replies raced against our own join cannot be lost to us.
        sender.send(&Signal::Join(me));
        sender.send(&Signal::SyncReq(user.id.clone()));
        state.lock().unwrap().phase = RoomPhase::Active;
        info!("User {} joined session {}", user.id, session.id);

        let pump_core = core.clone();
        let pump = tokio::spawn(async move {
            while let Some(signal) = receiver.recv().await {
                if !pump_core.apply(signal) {
                    break;
                }
            }
            debug!("Signal pump for session {} exiting", pump_core.session_id);
        });

        Ok(RoomHandle {
            session_id: session.id.clone(),
            user: user.clone(),
            is_host: session.is_host(&user.id),
            state,
            sender,
            events: events_rx,
            pump,
            media_devices: media,
        })
    }
}

/// Caller-facing handle to a joined room. Dropping it without `leave` still
/// releases resources, but peers then only notice the departure when the
/// transport surfaces it.
pub struct RoomHandle {
    session_id: String,
    user: User,
    is_host: bool,
    state: Arc<Mutex<RoomState>>,
    sender: TopicSender,
    events: mpsc::UnboundedReceiver<RoomEvent>,
    pump: tokio::task::JoinHandle<()>,
    media_devices: Arc<dyn MediaDevices>,
}

impl RoomHandle {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn phase(&self) -> RoomPhase {
        self.state.lock().unwrap().phase
    }

    /// Local membership view in arrival order.
    pub fn participants(&self) -> Vec<LiveParticipant> {
        self.state.lock().unwrap().store.snapshot()
    }

    pub fn transcript(&self) -> Vec<LiveMessage> {
        self.state.lock().unwrap().chat.transcript().to_vec()
    }

    pub async fn next_event(&mut self) -> Option<RoomEvent> {
        self.events.recv().await
    }

    /// Merge a partial update into our own record, mirror it onto the local
    /// tracks, and broadcast it.
    pub fn update_status(&self, updates: StatusUpdate) {
        {
            let mut state = self.state.lock().unwrap();
            if state.phase == RoomPhase::Left {
                return;
            }
            state.store.merge(&self.user.id, &updates);
            if let Some(media) = state.media.as_mut() {
                if let Some(muted) = updates.is_muted {
                    media.set_audio_enabled(!muted);
                }
                if let Some(camera_off) = updates.is_camera_off {
                    media.set_video_enabled(!camera_off);
                }
            }
        }
        self.sender.send(&Signal::UpdateStatus(StatusPatch {
            id: self.user.id.clone(),
            updates,
        }));
    }

    pub fn set_muted(&self, muted: bool) {
        self.update_status(StatusUpdate::muted(muted));
    }

    pub fn set_camera_off(&self, camera_off: bool) {
        self.update_status(StatusUpdate::camera_off(camera_off));
    }

    pub fn set_hand_raised(&self, raised: bool) {
        self.update_status(StatusUpdate::hand_raised(raised));
    }

    /// Append a chat message locally and fan it out. Empty input and posts
    /// after departure are dropped.
    pub fn send_chat(&self, text: &str) -> Option<LiveMessage> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let message = LiveMessage::new(&self.user, &self.session_id, text.to_string());
        {
            let mut state = self.state.lock().unwrap();
            if state.phase == RoomPhase::Left {
                return None;
            }
            state.chat.post(message.clone());
        }
        self.sender.send(&Signal::Chat(message.clone()));
        Some(message)
    }

    /// Swap the local stream to screen capture. On failure the prior camera
    /// stream is restored and the error is returned.
    pub async fn start_screen_share(&self) -> Result<(), LiveError> {
        match self.media_devices.acquire_screen().await {
            Ok(screen) => {
                let mut state = self.state.lock().unwrap();
                if let Some(old) = state.media.take() {
                    old.stop();
                }
                state.media = Some(screen);
                drop(state);
                self.update_status(StatusUpdate::screen_sharing(true));
                Ok(())
            }
            Err(e) => {
                warn!("Screen share failed for user {}: {}", self.user.id, e);
                if let Ok(camera) = self.media_devices.acquire_camera().await {
                    let mut state = self.state.lock().unwrap();
                    if let Some(old) = state.media.take() {
                        old.stop();
                    }
                    state.media = Some(camera);
                }
                Err(e)
            }
        }
    }

    /// Return from screen capture to the camera stream.
    pub async fn stop_screen_share(&self) {
        match self.media_devices.acquire_camera().await {
            Ok(camera) => {
                let mut state = self.state.lock().unwrap();
                if let Some(old) = state.media.take() {
                    old.stop();
                }
                state.media = Some(camera);
            }
            Err(e) => {
                warn!("Could not revert to camera for user {}: {}", self.user.id, e);
                let mut state = self.state.lock().unwrap();
                if let Some(old) = state.media.take() {
                    old.stop();
                }
            }
        }
        self.update_status(StatusUpdate::screen_sharing(false));
    }

    /// Host-only: broadcast termination to every observer on the topic.
    /// Our own loop-back delivery then drives the local transition to
    /// `Left`, whether or not any peer received the broadcast.
    pub fn end_session(&self) -> Result<(), LiveError> {
        if !self.is_host {
            return Err(LiveError::Unauthorized(
                "only the host may end the session".to_string(),
            ));
        }
        self.sender.send(&Signal::EndSession {});
        Ok(())
    }

    /// Leave the room: stop local media, announce departure, release the
    /// topic. All three run even if an earlier step misbehaves.
    pub fn leave(self) {
        let RoomHandle { session_id, user, state, sender, pump, .. } = self;
        // Releases the subscription last, whatever happens above it.
        let _close = ScopeGuard::new(|| {
            pump.abort();
            info!("User {} left session {}", user.id, session_id);
        });

        {
            let mut st = state.lock().unwrap();
            st.phase = RoomPhase::Left;
            if let Some(media) = st.media.take() {
                media.stop();
            }
        }
        sender.send(&Signal::Leave(user.id.clone()));
    }
}
