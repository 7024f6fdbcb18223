//! Integration tests for event dispatch, join waiters, and room handles.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use lobbyist_protocol::{
    Codec, GameResult, JsonCodec, LobbyEvent, PlayerScore, Request,
    RequestFrame, RoomId, ScoreCause, ServerFrame,
};
use lobbyist_room::{
    CallbackWorker, Dispatcher, RoomError, RoomListener, SessionHandle,
    WaiterRegistry,
};
use lobbyist_session::{EventStream, Session, SessionConfig};
use lobbyist_transport::{Connection, MemoryConnection};
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

fn room(id: &str) -> RoomId {
    RoomId::from(id)
}

fn dispatcher() -> (Dispatcher, WaiterRegistry) {
    let registry = WaiterRegistry::new();
    let worker = CallbackWorker::spawn(16);
    (Dispatcher::new(registry.clone(), worker), registry)
}

fn session_pair() -> (Session, EventStream, MemoryConnection) {
    let (client, server) = MemoryConnection::pair();
    let (session, events) = Session::start(client, SessionConfig::default());
    (session, events, server)
}

async fn push_event(server: &MemoryConnection, event: LobbyEvent) {
    let bytes = JsonCodec.encode(&ServerFrame::Event(event)).unwrap();
    server.send(&bytes).await.unwrap();
}

async fn next_request(server: &MemoryConnection) -> Request {
    let bytes = server.recv().await.unwrap().expect("client connected");
    let frame: RequestFrame = JsonCodec.decode(&bytes).unwrap();
    frame.request
}

/// Records every listener call as a short string.
struct Recorder {
    tx: mpsc::UnboundedSender<String>,
}

impl RoomListener for Recorder {
    fn on_new_state(&self, room_id: &RoomId, state: &[u8]) {
        let _ = self.tx.send(format!("{room_id}:state:{}", state.len()));
    }

    fn on_error(&self, room_id: &RoomId, message: &str) {
        let _ = self.tx.send(format!("{room_id}:error:{message}"));
    }

    fn on_game_left(&self, room_id: &RoomId) {
        let _ = self.tx.send(format!("{room_id}:left"));
    }

    fn on_paused(&self, room_id: &RoomId, next_player: &str) {
        let _ = self.tx.send(format!("{room_id}:paused:{next_player}"));
    }

    fn on_observed(&self, room_id: &RoomId) {
        let _ = self.tx.send(format!("{room_id}:observed"));
    }
}

fn recorder() -> (Arc<Recorder>, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(Recorder { tx }), rx)
}

struct Panicker;

impl RoomListener for Panicker {
    fn on_new_state(&self, _room_id: &RoomId, _state: &[u8]) {
        panic!("listener failure");
    }
}

// =========================================================================
// Join waiters
// =========================================================================

#[tokio::test]
async fn test_wildcard_waiter_fires_once_across_rooms() {
    let (dispatcher, registry) = dispatcher();
    let wait = registry.register_any();

    dispatcher
        .dispatch(LobbyEvent::GameJoined { room_id: room("room-7") })
        .await;
    dispatcher
        .dispatch(LobbyEvent::GameJoined { room_id: room("room-8") })
        .await;

    assert_eq!(wait.await.unwrap().room_id, room("room-7"));
    assert_eq!(registry.pending_waiters(), 0);
    assert_eq!(registry.joins_in_room(Some(&room("room-7"))), 1);
    assert_eq!(registry.joins_in_room(Some(&room("room-8"))), 1);
}

#[tokio::test]
async fn test_join_counts_are_stable_between_events() {
    let (dispatcher, registry) = dispatcher();
    for _ in 0..3 {
        dispatcher
            .dispatch(LobbyEvent::GameJoined { room_id: room("r") })
            .await;
    }

    for _ in 0..5 {
        assert_eq!(registry.joins_in_room(Some(&room("r"))), 3);
    }
    assert_eq!(registry.joins_in_room(None), 3);
    assert_eq!(registry.joins_in_room(Some(&room("other"))), 0);
}

#[tokio::test]
async fn test_abandoned_wait_leaves_no_registration() {
    let (dispatcher, registry) = dispatcher();
    let wait = registry.register_for_room(&room("r"));

    let timed = tokio::time::timeout(Duration::from_millis(10), wait).await;
    assert!(timed.is_err());
    assert_eq!(registry.pending_waiters(), 0);

    // A later join has nobody to wake but is still counted.
    dispatcher
        .dispatch(LobbyEvent::GameJoined { room_id: room("r") })
        .await;
    assert_eq!(registry.joins_in_room(Some(&room("r"))), 1);
}

// =========================================================================
// Game over
// =========================================================================

#[tokio::test]
async fn test_game_over_without_handler_is_silent() {
    let (dispatcher, registry) = dispatcher();

    dispatcher
        .dispatch(LobbyEvent::GameOver {
            room_id: room("room-9"),
            result: GameResult::default(),
        })
        .await;

    assert_eq!(registry.pending_waiters(), 0);
    assert!(registry.take_game_over_handler(&room("room-9")).is_none());
}

#[tokio::test]
async fn test_game_over_handler_receives_result_once() {
    let (dispatcher, registry) = dispatcher();
    let (tx, mut rx) = mpsc::unbounded_channel();
    registry.set_game_over_handler(
        &room("r"),
        Box::new(move |result| {
            let _ = tx.send(result);
        }),
    );

    let result = GameResult {
        winner: Some("One".into()),
        scores: vec![PlayerScore {
            name: "One".into(),
            cause: ScoreCause::Regular,
            points: 2,
        }],
    };
    for _ in 0..2 {
        dispatcher
            .dispatch(LobbyEvent::GameOver {
                room_id: room("r"),
                result: result.clone(),
            })
            .await;
    }

    assert_eq!(rx.recv().await, Some(result));
    // The handler was consumed by the first event; `tx` dropped with it.
    assert_eq!(rx.recv().await, None);
}

// =========================================================================
// Listeners
// =========================================================================

#[tokio::test]
async fn test_listener_sees_room_events_in_order() {
    let (dispatcher, registry) = dispatcher();
    let (listener, mut seen) = recorder();
    registry.add_listener(&room("r"), listener);

    dispatcher
        .dispatch(LobbyEvent::NewState { room_id: room("r"), state: vec![1, 2] })
        .await;
    dispatcher
        .dispatch(LobbyEvent::GamePaused {
            room_id: room("r"),
            next_player: "Two".into(),
        })
        .await;
    dispatcher
        .dispatch(LobbyEvent::NewState { room_id: room("elsewhere"), state: vec![] })
        .await;
    dispatcher
        .dispatch(LobbyEvent::GameLeft { room_id: room("r") })
        .await;

    assert_eq!(seen.recv().await.unwrap(), "r:state:2");
    assert_eq!(seen.recv().await.unwrap(), "r:paused:Two");
    assert_eq!(seen.recv().await.unwrap(), "r:left");
}

#[tokio::test]
async fn test_panicking_listener_does_not_block_others() {
    let (dispatcher, registry) = dispatcher();
    let (listener, mut seen) = recorder();
    registry.add_listener(&room("r"), Arc::new(Panicker));
    registry.add_listener(&room("r"), listener);

    dispatcher
        .dispatch(LobbyEvent::NewState { room_id: room("r"), state: vec![0] })
        .await;
    dispatcher
        .dispatch(LobbyEvent::Error {
            room_id: room("r"),
            message: "illegal move".into(),
        })
        .await;

    assert_eq!(seen.recv().await.unwrap(), "r:state:1");
    assert_eq!(seen.recv().await.unwrap(), "r:error:illegal move");
}

#[tokio::test]
async fn test_spawned_dispatcher_drains_session_events() {
    let (_session, events, server) = session_pair();
    let registry = WaiterRegistry::new();
    let (listener, mut seen) = recorder();
    registry.add_listener(&room("r"), listener);

    let task = Dispatcher::new(registry.clone(), CallbackWorker::spawn(8)).spawn(events);
    let wait = registry.register_for_room(&room("r"));

    push_event(&server, LobbyEvent::GameObserved { room_id: room("r") }).await;
    push_event(&server, LobbyEvent::GameJoined { room_id: room("r") }).await;
    assert_eq!(wait.await.unwrap().room_id, room("r"));
    assert_eq!(seen.recv().await.unwrap(), "r:observed");

    server.close().await.unwrap();
    task.await.unwrap();
}

// =========================================================================
// SessionHandle
// =========================================================================

#[tokio::test]
async fn test_handle_sends_room_controls() {
    let (session, _events, server) = session_pair();
    let handle = SessionHandle::new(session, WaiterRegistry::new(), room("room-2"));

    handle.observe().await.unwrap();
    handle.set_timeout(1, false).await.unwrap();
    handle.pause().await.unwrap();
    handle.resume().await.unwrap();

    assert_eq!(
        next_request(&server).await,
        Request::Observe { room_id: room("room-2") }
    );
    assert_eq!(
        next_request(&server).await,
        Request::ControlTimeout {
            room_id: room("room-2"),
            enabled: false,
            slot: 1,
        }
    );
    assert_eq!(
        next_request(&server).await,
        Request::Pause { room_id: room("room-2") }
    );
    assert_eq!(
        next_request(&server).await,
        Request::Resume { room_id: room("room-2") }
    );
}

#[tokio::test]
async fn test_closed_handle_rejects_commands_and_releases_room() {
    let (session, _events, _server) = session_pair();
    let registry = WaiterRegistry::new();
    let handle = SessionHandle::new(session, registry.clone(), room("r"));
    let fired = Arc::new(Mutex::new(false));
    let f = Arc::clone(&fired);
    handle.set_game_over_handler(Box::new(move |_| {
        *f.lock().unwrap() = true;
    }));
    let (listener, _seen) = recorder();
    handle.add_listener(listener);

    handle.close();
    handle.close();

    assert!(handle.is_closed());
    assert!(matches!(handle.pause().await, Err(RoomError::HandleClosed(id)) if id == room("r")));
    assert!(registry.listeners(&room("r")).is_empty());
    assert!(registry.take_game_over_handler(&room("r")).is_none());
    assert!(!*fired.lock().unwrap());
}
