//! The `Lobby`: entry point tying session, dispatch, and start protocols
//! together.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::FutureExt;

use lobbyist_protocol::RoomId;
use lobbyist_room::{CallbackWorker, Dispatcher, SessionHandle, WaiterRegistry};
use lobbyist_session::{CredentialProvider, EventStream, Session};
use tokio::sync::{oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

use crate::start::{HandleSlot, StartContext};
use crate::{GameStart, GameStartError, LobbyConfig, LobbyError, Participant, StartOptions};

/// The start protocol currently running or last run.
struct ActiveStart {
    task: JoinHandle<()>,
    handle: HandleSlot,
}

impl ActiveStart {
    /// Stops the start protocol and releases its room.
    ///
    /// The task is awaited, so its join waiters are gone before this
    /// returns.
    async fn tear_down(self) {
        self.task.abort();
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                tracing::warn!(error = %e, "previous game start task failed");
            }
        }
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            tracing::info!(room_id = %handle.room_id(), "closing previous game");
            handle.close();
        }
    }
}

struct LobbyInner {
    session: Session,
    registry: WaiterRegistry,
    config: LobbyConfig,
    dispatcher: JoinHandle<()>,
    current: AsyncMutex<Option<ActiveStart>>,
}

impl Drop for LobbyInner {
    fn drop(&mut self) {
        self.dispatcher.abort();
        if let Some(active) = self.current.get_mut().take() {
            active.task.abort();
        }
    }
}

/// Starts games on a game server and follows the rooms they run in.
///
/// One lobby owns one session. Starting a game while an earlier start is
/// still running (or its room is still observed) tears the earlier one
/// down first: the newest start wins.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use lobbyist::prelude::*;
///
/// # async fn run() -> Result<(), LobbyError> {
/// let lobby = Lobby::connect(LobbyConfig::from_env()?, &EnvCredential::default()).await?;
/// let players: Vec<Arc<dyn Participant>> = vec![
///     Arc::new(ExternalParticipant::new("One")),
///     Arc::new(ExternalParticipant::new("Two")),
/// ];
/// let mut start = lobby.start_new_game(players, StartOptions::prepared()).await;
/// let room_id = start.room_id().await?;
/// start.started().await?;
/// println!("playing in {room_id}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Lobby {
    inner: Arc<LobbyInner>,
}

impl Lobby {
    /// Connects to the configured server and authenticates.
    ///
    /// # Errors
    /// Connection failures are fatal and returned as is; nothing is
    /// retried.
    pub async fn connect(
        config: LobbyConfig,
        credential: &impl CredentialProvider,
    ) -> Result<Self, LobbyError> {
        let (session, events) = Session::connect(config.session.clone()).await?;
        session.authenticate_with(credential).await?;
        Ok(Self::from_session(session, events, config))
    }

    /// Builds a lobby over an already started session.
    ///
    /// Takes over the session's event stream. Must be called from within a
    /// Tokio runtime.
    pub fn from_session(session: Session, events: EventStream, config: LobbyConfig) -> Self {
        let registry = WaiterRegistry::new();
        let worker = CallbackWorker::spawn(config.callback_queue);
        let dispatcher = Dispatcher::new(registry.clone(), worker).spawn(events);

        Self {
            inner: Arc::new(LobbyInner {
                session,
                registry,
                config,
                dispatcher,
                current: AsyncMutex::new(None),
            }),
        }
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    pub fn config(&self) -> &LobbyConfig {
        &self.inner.config
    }

    /// Starts a game with `participants`.
    ///
    /// Returns once the start protocol is running; progress is reported
    /// through the returned [`GameStart`]. Any earlier start is torn down
    /// first, and its `started()` then reports
    /// [`GameStartError::Superseded`](crate::GameStartError::Superseded)
    /// unless it had already finished.
    pub async fn start_new_game(
        &self,
        participants: Vec<Arc<dyn Participant>>,
        options: StartOptions,
    ) -> GameStart {
        let mut current = self.inner.current.lock().await;
        if let Some(previous) = current.take() {
            previous.tear_down().await;
        }

        let (room_tx, room_rx) = oneshot::channel();
        let (started_tx, started_rx) = oneshot::channel();
        let handle_slot: HandleSlot = Arc::new(Mutex::new(None));

        let ctx = StartContext {
            session: self.inner.session.clone(),
            registry: self.inner.registry.clone(),
            game_type: self.inner.config.game_type.clone(),
            handle_slot: Arc::clone(&handle_slot),
        };
        let task = tokio::spawn(async move {
            let outcome = AssertUnwindSafe(ctx.run(participants, options, room_tx))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| {
                    Err(GameStartError::Panicked(panic_message(payload.as_ref())))
                });
            match &outcome {
                Ok(()) => tracing::info!("game started"),
                Err(e) => tracing::warn!(error = %e, "game start failed"),
            }
            let _ = started_tx.send(outcome);
        });

        *current = Some(ActiveStart {
            task,
            handle: handle_slot,
        });
        GameStart::new(room_rx, started_rx)
    }

    /// Handle of the room the latest start is observing, if it got that
    /// far.
    pub async fn current_game(&self) -> Option<SessionHandle> {
        let current = self.inner.current.lock().await;
        current.as_ref().and_then(|active| {
            active
                .handle
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        })
    }

    /// Joins seen in `room_id`, or in every room for `None`.
    pub fn joins_in_room(&self, room_id: Option<&RoomId>) -> usize {
        self.inner.registry.joins_in_room(room_id)
    }

    /// Join waiters still registered; zero once no start is waiting.
    pub fn pending_waiters(&self) -> usize {
        self.inner.registry.pending_waiters()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
