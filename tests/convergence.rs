//! Multi-observer scenarios over the in-process signal bus: membership
//! convergence, status propagation, chat fan-out, and host termination.

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use chrono::Utc;
use uuid::Uuid;

use studio_live::bus::local::LocalSignalBus;
use studio_live::bus::relay::{relay_handler, RelayState};
use studio_live::bus::remote::RemoteSignalBus;
use studio_live::lifecycle::SessionLifecycleController;
use studio_live::models::{LiveSession, SessionStatus, User, UserRole};
use studio_live::presence::media::{GatedMedia, UnrestrictedMedia};
use studio_live::presence::reconciler::{PresenceReconciler, RoomHandle, RoomPhase};
use studio_live::registry::SessionRegistry;
use studio_live::store::session_store::SessionStore;

fn user(id: &str, role: UserRole) -> User {
    User {
        id: id.to_string(),
        full_name: format!("User {}", id),
        avatar: format!("https://cdn.test/{}.png", id),
        role,
    }
}

fn live_session(host: &User) -> LiveSession {
    LiveSession {
        id: Uuid::new_v4().to_string(),
        title: "Test room".to_string(),
        description: String::new(),
        status: SessionStatus::Live,
        host_id: host.id.clone(),
        host_name: host.full_name.clone(),
        host_avatar: host.avatar.clone(),
        started_at: Some(Utc::now()),
        scheduled_for: None,
        ended_at: None,
        participants: Vec::new(),
        is_locked: false,
    }
}

async fn join(session: &LiveSession, user: &User, bus: &LocalSignalBus) -> RoomHandle {
    PresenceReconciler::join(session, user, bus, Arc::new(UnrestrictedMedia))
        .await
        .unwrap()
}

/// Signal delivery runs on spawned pump tasks, so assertions about another
/// observer's view have to poll until the view settles.
async fn wait_for<F>(what: &str, cond: F)
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !cond() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for: {}", what);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Serve the websocket relay on an ephemeral port, as main.rs wires it.
async fn spawn_relay() -> (Arc<RelayState>, String) {
    let relay = Arc::new(RelayState::new());
    let app = Router::new()
        .route("/ws/sessions/:session_id", get(relay_handler))
        .with_state(relay.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (relay, format!("ws://{}", addr))
}

fn member_ids(handle: &RoomHandle) -> Vec<String> {
    let mut ids: Vec<String> = handle.participants().iter().map(|p| p.id.clone()).collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn two_observers_converge_on_membership() {
    let bus = LocalSignalBus::new();
    let host = user("a", UserRole::Host);
    let session = live_session(&host);

    let a = join(&session, &host, &bus).await;
    assert_eq!(member_ids(&a), vec!["a"]);

    let b = join(&session, &user("b", UserRole::Member), &bus).await;

    // A learns of B from the JOIN; B learns of A from A's reply.
    wait_for("A to see both members", || member_ids(&a) == ["a", "b"]).await;
    wait_for("B to see both members", || member_ids(&b) == ["a", "b"]).await;
}

#[tokio::test]
async fn late_joiner_learns_current_status_not_initial() {
    let bus = LocalSignalBus::new();
    let host = user("a", UserRole::Host);
    let session = live_session(&host);

    let a = join(&session, &host, &bus).await;
    // Broadcast while alone; nobody hears it, only A's own record changes.
    a.set_hand_raised(true);

    let b = join(&session, &user("b", UserRole::Member), &bus).await;

    // The reply to B's JOIN must carry A's record as it is now.
    wait_for("B to see A's raised hand", || {
        b.participants().iter().any(|p| p.id == "a" && p.is_hand_raised)
    })
    .await;
}

#[tokio::test]
async fn status_update_touches_only_named_fields() {
    let bus = LocalSignalBus::new();
    let host = user("a", UserRole::Host);
    let session = live_session(&host);

    let a = join(&session, &host, &bus).await;
    let b = join(&session, &user("b", UserRole::Member), &bus).await;
    wait_for("rooms to converge", || {
        member_ids(&a) == ["a", "b"] && member_ids(&b) == ["a", "b"]
    })
    .await;

    a.set_muted(true);
    wait_for("B to see A muted", || {
        b.participants().iter().any(|p| p.id == "a" && p.is_muted)
    })
    .await;

    // Everything the update did not name is untouched on B's copy.
    let record = b
        .participants()
        .into_iter()
        .find(|p| p.id == "a")
        .unwrap();
    assert!(!record.is_camera_off);
    assert!(!record.is_hand_raised);
    assert!(!record.is_screen_sharing);
}

#[tokio::test]
async fn chat_fans_out_exactly_once() {
    let bus = LocalSignalBus::new();
    let host = user("a", UserRole::Host);
    let session = live_session(&host);

    let a = join(&session, &host, &bus).await;
    let b = join(&session, &user("b", UserRole::Member), &bus).await;
    wait_for("rooms to converge", || member_ids(&b) == ["a", "b"]).await;

    let sent = a.send_chat("hello room").unwrap();
    // The sender's transcript gains the message synchronously.
    assert_eq!(a.transcript().len(), 1);

    wait_for("B to receive the message", || b.transcript().len() == 1).await;
    assert_eq!(b.transcript()[0].id, sent.id);
    assert_eq!(b.transcript()[0].text, "hello room");

    // A's own loop-back echo must not duplicate the entry.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(a.transcript().len(), 1);

    // Whitespace-only input is dropped before it reaches the wire.
    assert!(a.send_chat("   ").is_none());
}

#[tokio::test]
async fn leave_removes_departed_member_from_peers() {
    let bus = LocalSignalBus::new();
    let host = user("a", UserRole::Host);
    let session = live_session(&host);

    let a = join(&session, &host, &bus).await;
    let b = join(&session, &user("b", UserRole::Member), &bus).await;
    wait_for("rooms to converge", || member_ids(&a) == ["a", "b"]).await;

    b.leave();
    wait_for("A to drop B", || member_ids(&a) == ["a"]).await;
}

#[tokio::test]
async fn host_termination_reaches_every_observer() {
    let bus = LocalSignalBus::new();
    let host = user("a", UserRole::Host);
    let session = live_session(&host);

    let a = join(&session, &host, &bus).await;
    let b = join(&session, &user("b", UserRole::Member), &bus).await;
    wait_for("rooms to converge", || member_ids(&b) == ["a", "b"]).await;

    // Non-hosts are refused before anything hits the wire.
    assert!(matches!(
        b.end_session(),
        Err(studio_live::models::LiveError::Unauthorized(_))
    ));
    assert_eq!(b.phase(), RoomPhase::Active);

    a.end_session().unwrap();
    wait_for("B to leave on termination", || b.phase() == RoomPhase::Left).await;
    // The host's own loop-back delivery drives its local exit too.
    wait_for("A to leave on termination", || a.phase() == RoomPhase::Left).await;

    // Posting into a terminated room is a no-op.
    assert!(b.send_chat("anyone there?").is_none());
    assert!(b.transcript().is_empty());
}

#[tokio::test]
async fn denied_media_downgrades_the_join() {
    let bus = LocalSignalBus::new();
    let host = user("a", UserRole::Host);
    let session = live_session(&host);

    let a = PresenceReconciler::join(
        &session,
        &host,
        &bus,
        Arc::new(GatedMedia { allow_camera: false, allow_screen: false }),
    )
    .await
    .unwrap();

    let me = a.participants().into_iter().find(|p| p.id == "a").unwrap();
    assert!(me.is_muted);
    assert!(me.is_camera_off);
    assert_eq!(a.phase(), RoomPhase::Active);
}

#[tokio::test]
async fn screen_share_failure_reverts_to_camera() {
    let bus = LocalSignalBus::new();
    let host = user("a", UserRole::Host);
    let session = live_session(&host);

    let a = PresenceReconciler::join(
        &session,
        &host,
        &bus,
        Arc::new(GatedMedia { allow_camera: true, allow_screen: false }),
    )
    .await
    .unwrap();

    let err = a.start_screen_share().await.unwrap_err();
    assert!(matches!(err, studio_live::models::LiveError::ScreenShareFailed(_)));

    // The failed attempt never flips the broadcast flag.
    let me = a.participants().into_iter().find(|p| p.id == "a").unwrap();
    assert!(!me.is_screen_sharing);
}

#[tokio::test]
async fn observers_converge_through_the_relay() {
    let (_relay, base_url) = spawn_relay().await;
    let bus = RemoteSignalBus::new(base_url);
    let host = user("a", UserRole::Host);
    let session = live_session(&host);

    let a = PresenceReconciler::join(&session, &host, &bus, Arc::new(UnrestrictedMedia))
        .await
        .unwrap();
    let b = PresenceReconciler::join(
        &session,
        &user("b", UserRole::Member),
        &bus,
        Arc::new(UnrestrictedMedia),
    )
    .await
    .unwrap();

    // Each observer holds its own websocket; convergence runs over the
    // server-side fan-out, not a shared in-process channel.
    wait_for("relay observers to converge", || {
        member_ids(&a) == ["a", "b"] && member_ids(&b) == ["a", "b"]
    })
    .await;

    a.set_muted(true);
    wait_for("B to see A muted over the relay", || {
        b.participants().iter().any(|p| p.id == "a" && p.is_muted)
    })
    .await;
}

#[tokio::test]
async fn server_side_termination_reaches_relay_observers() {
    let (relay, base_url) = spawn_relay().await;
    let store_path =
        std::env::temp_dir().join(format!("studio-live-relay-end-{}.json", Uuid::new_v4()));
    let registry = Arc::new(SessionRegistry::load(SessionStore::new(&store_path)).await);
    // The relay is the controller's bus, as in main.rs.
    let controller = SessionLifecycleController::new(registry, relay.clone());

    let host = user("host", UserRole::Host);
    let session = controller
        .create(&host, "Ops review".to_string(), String::new(), None)
        .await
        .unwrap();

    let bus = RemoteSignalBus::new(base_url);
    let a = PresenceReconciler::join(&session, &host, &bus, Arc::new(UnrestrictedMedia))
        .await
        .unwrap();
    let b = PresenceReconciler::join(
        &session,
        &user("viewer", UserRole::Member),
        &bus,
        Arc::new(UnrestrictedMedia),
    )
    .await
    .unwrap();
    wait_for("relay observers to converge", || {
        member_ids(&a) == ["host", "viewer"] && member_ids(&b) == ["host", "viewer"]
    })
    .await;

    // Ending through the HTTP-facing controller must reach observers whose
    // only link to the room is their websocket.
    let ended = controller.end(&session.id, &host).await.unwrap();
    assert_eq!(ended.status, SessionStatus::Ended);

    wait_for("relay observers to exit on termination", || {
        a.phase() == RoomPhase::Left && b.phase() == RoomPhase::Left
    })
    .await;

    let _ = std::fs::remove_file(&store_path);
}

/// A full run-through: create a room, go live, converge two observers,
/// propagate a hand raise, and let the host close it down.
#[tokio::test]
async fn session_round_trip_end_to_end() {
    let bus = Arc::new(LocalSignalBus::new());
    let store_path = std::env::temp_dir().join(format!("studio-live-e2e-{}.json", Uuid::new_v4()));
    let registry = Arc::new(SessionRegistry::load(SessionStore::new(&store_path)).await);
    let controller = SessionLifecycleController::new(registry.clone(), bus.clone());

    let host = user("host", UserRole::Host);
    let viewer = user("viewer", UserRole::Member);

    let session = controller
        .create(&host, "Demo".to_string(), "Walkthrough".to_string(), None)
        .await
        .unwrap();
    assert_eq!(session.status, SessionStatus::Live);
    assert!(session.started_at.is_some());

    let a = join(&session, &host, bus.as_ref()).await;
    assert_eq!(member_ids(&a), vec!["host"]);

    let b = join(&session, &viewer, bus.as_ref()).await;
    wait_for("both observers to converge", || {
        member_ids(&a) == ["host", "viewer"] && member_ids(&b) == ["host", "viewer"]
    })
    .await;

    a.set_hand_raised(true);
    wait_for("viewer to see the raised hand", || {
        b.participants().iter().any(|p| p.id == "host" && p.is_hand_raised)
    })
    .await;

    let ended = controller.end(&session.id, &host).await.unwrap();
    assert_eq!(ended.status, SessionStatus::Ended);
    assert!(ended.ended_at.is_some());

    wait_for("observers to exit on termination", || {
        a.phase() == RoomPhase::Left && b.phase() == RoomPhase::Left
    })
    .await;

    let _ = std::fs::remove_file(&store_path);
}
