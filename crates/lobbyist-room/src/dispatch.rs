//! Event dispatch: one task that drains the session's event stream and
//! routes each event to the registry or to the room's listeners.

use std::sync::Arc;

use lobbyist_protocol::LobbyEvent;
use lobbyist_session::EventStream;
use tokio::task::JoinHandle;

use crate::{CallbackWorker, RoomListener, WaiterRegistry};

/// Routes inbound events.
///
/// Join events resolve waiters inline, everything that runs application
/// code goes through the [`CallbackWorker`].
#[derive(Clone)]
pub struct Dispatcher {
    registry: WaiterRegistry,
    worker: CallbackWorker,
}

impl Dispatcher {
    pub fn new(registry: WaiterRegistry, worker: CallbackWorker) -> Self {
        Self { registry, worker }
    }

    /// Spawns the dispatch loop. The task ends with the event stream.
    pub fn spawn(self, events: EventStream) -> JoinHandle<()> {
        tokio::spawn(self.run(events))
    }

    /// Dispatches events until the stream ends.
    pub async fn run(self, mut events: EventStream) {
        while let Some(event) = events.next().await {
            self.dispatch(event).await;
        }
        tracing::debug!("event stream ended, dispatcher stopping");
    }

    /// Routes one event.
    pub async fn dispatch(&self, event: LobbyEvent) {
        match event {
            LobbyEvent::GameJoined { room_id } => {
                let woken = self.registry.resolve_join(&room_id);
                tracing::debug!(%room_id, woken, "game joined");
            }
            LobbyEvent::GameOver { room_id, result } => {
                let Some(handler) = self.registry.take_game_over_handler(&room_id)
                else {
                    tracing::debug!(%room_id, "game over with no handler");
                    return;
                };
                tracing::info!(%room_id, winner = ?result.winner, "game over");
                if self.worker.submit(move || handler(result)).await.is_err() {
                    tracing::warn!(%room_id, "callback worker gone, game-over dropped");
                }
            }
            LobbyEvent::GamePrepared(prepared) => {
                // Prepared rooms are handled through the request/response
                // path; the pushed copy only gets logged.
                tracing::debug!(room_id = %prepared.room_id, "game prepared event");
            }
            other => self.deliver_to_listeners(other).await,
        }
    }

    async fn deliver_to_listeners(&self, event: LobbyEvent) {
        let room_id = event.room_id().clone();
        let listeners = self.registry.listeners(&room_id);
        if listeners.is_empty() {
            tracing::debug!(%room_id, kind = event.kind(), "no listeners for event");
            return;
        }

        let event = Arc::new(event);
        for listener in listeners {
            let event = Arc::clone(&event);
            let submitted = self
                .worker
                .submit(move || deliver(listener.as_ref(), &event))
                .await;
            if submitted.is_err() {
                tracing::warn!(%room_id, "callback worker gone, event dropped");
                return;
            }
        }
    }
}

fn deliver(listener: &dyn RoomListener, event: &LobbyEvent) {
    match event {
        LobbyEvent::NewState { room_id, state } => listener.on_new_state(room_id, state),
        LobbyEvent::Error { room_id, message } => listener.on_error(room_id, message),
        LobbyEvent::RoomMessage { room_id, payload } => {
            listener.on_room_message(room_id, payload)
        }
        LobbyEvent::GameLeft { room_id } => listener.on_game_left(room_id),
        LobbyEvent::GamePaused {
            room_id,
            next_player,
        } => listener.on_paused(room_id, next_player),
        LobbyEvent::GameObserved { room_id } => listener.on_observed(room_id),
        LobbyEvent::GameJoined { .. }
        | LobbyEvent::GameOver { .. }
        | LobbyEvent::GamePrepared(_) => {}
    }
}
