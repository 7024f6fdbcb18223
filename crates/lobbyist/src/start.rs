//! The two game-start protocols and the futures a caller gets back.

use std::sync::{Arc, Mutex, PoisonError};

use lobbyist_protocol::{GameResult, GameType, RoomId, SlotDescriptor};
use lobbyist_room::{GameOverHandler, RoomListener, SessionHandle, WaiterRegistry};
use lobbyist_session::Session;
use tokio::sync::oneshot;

use crate::{GameStartError, Participant};

// ---------------------------------------------------------------------------
// StartOptions
// ---------------------------------------------------------------------------

/// How a game should be started.
///
/// `prepared` games reserve one slot per participant up front; open games
/// seat participants through matchmaking, one at a time.
pub struct StartOptions {
    pub prepared: bool,
    /// Keep the game paused once it exists. Prepared games are created
    /// paused; open games are paused right after we start observing.
    pub paused: bool,
    pub listeners: Vec<Arc<dyn RoomListener>>,
    pub on_game_over: Option<GameOverHandler>,
}

impl StartOptions {
    /// A prepared start, not paused, with no listeners.
    pub fn prepared() -> Self {
        Self {
            prepared: true,
            paused: false,
            listeners: Vec::new(),
            on_game_over: None,
        }
    }

    /// An open-join start.
    pub fn open() -> Self {
        Self {
            prepared: false,
            ..Self::prepared()
        }
    }

    pub fn with_paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn RoomListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Called once with the result when the game ends.
    pub fn on_game_over(
        mut self,
        handler: impl FnOnce(GameResult) + Send + 'static,
    ) -> Self {
        self.on_game_over = Some(Box::new(handler));
        self
    }
}

impl Default for StartOptions {
    fn default() -> Self {
        Self::prepared()
    }
}

// ---------------------------------------------------------------------------
// GameStart
// ---------------------------------------------------------------------------

enum RoomSlot {
    Waiting(oneshot::Receiver<RoomId>),
    Known(RoomId),
    Never,
}

/// What [`Lobby::start_new_game`](crate::Lobby::start_new_game) returns.
///
/// The room id is usually known before every participant has joined, so
/// it has its own future next to the completion report.
pub struct GameStart {
    room: RoomSlot,
    started: oneshot::Receiver<Result<(), GameStartError>>,
}

impl GameStart {
    pub(crate) fn new(
        room: oneshot::Receiver<RoomId>,
        started: oneshot::Receiver<Result<(), GameStartError>>,
    ) -> Self {
        Self {
            room: RoomSlot::Waiting(room),
            started,
        }
    }

    /// Resolves with the room id as soon as it is known.
    ///
    /// # Errors
    /// [`GameStartError::NoRoom`] if the start ended without a room.
    pub async fn room_id(&mut self) -> Result<RoomId, GameStartError> {
        if let RoomSlot::Waiting(rx) = &mut self.room {
            self.room = match rx.await {
                Ok(room_id) => RoomSlot::Known(room_id),
                Err(_) => RoomSlot::Never,
            };
        }
        match &self.room {
            RoomSlot::Known(room_id) => Ok(room_id.clone()),
            _ => Err(GameStartError::NoRoom),
        }
    }

    /// Resolves once the start protocol has finished.
    pub async fn started(self) -> Result<(), GameStartError> {
        // Panics are reported, so a missing outcome means the task was
        // aborted by a newer start.
        self.started.await.unwrap_or(Err(GameStartError::Superseded))
    }
}

// ---------------------------------------------------------------------------
// Protocols
// ---------------------------------------------------------------------------

/// Shared slot for the handle of the room being started.
pub(crate) type HandleSlot = Arc<Mutex<Option<SessionHandle>>>;

/// Everything one start protocol run needs.
pub(crate) struct StartContext {
    pub(crate) session: Session,
    pub(crate) registry: WaiterRegistry,
    pub(crate) game_type: GameType,
    pub(crate) handle_slot: HandleSlot,
}

impl StartContext {
    pub(crate) async fn run(
        self,
        participants: Vec<Arc<dyn Participant>>,
        options: StartOptions,
        room_tx: oneshot::Sender<RoomId>,
    ) -> Result<(), GameStartError> {
        tracing::debug!(
            prepared = options.prepared,
            paused = options.paused,
            participants = participants.len(),
            "starting new game"
        );
        if options.prepared {
            self.run_prepared(participants, options, room_tx).await
        } else {
            self.run_open_join(participants, options, room_tx).await
        }
    }

    async fn run_prepared(
        &self,
        participants: Vec<Arc<dyn Participant>>,
        options: StartOptions,
        room_tx: oneshot::Sender<RoomId>,
    ) -> Result<(), GameStartError> {
        let slots = participants
            .iter()
            .map(|p| SlotDescriptor::new(p.name(), false))
            .collect();
        let prepared = self
            .session
            .prepare_game(self.game_type.clone(), slots, options.paused)
            .await?;

        if prepared.reservations.len() != participants.len() {
            return Err(GameStartError::ReservationMismatch {
                expected: participants.len(),
                got: prepared.reservations.len(),
            });
        }

        self.observe(&prepared.room_id, options).await?;
        let _ = room_tx.send(prepared.room_id.clone());

        for (participant, reservation) in participants.iter().zip(&prepared.reservations) {
            participant.join_prepared_game(reservation).await?;
        }
        Ok(())
    }

    async fn run_open_join(
        &self,
        participants: Vec<Arc<dyn Participant>>,
        options: StartOptions,
        room_tx: oneshot::Sender<RoomId>,
    ) -> Result<(), GameStartError> {
        let Some((first, rest)) = participants.split_first() else {
            return Ok(());
        };

        let any_join = self.registry.register_any();
        first.join_any_game().await?;
        let first_join = any_join.await?;
        let room_id = first_join.room_id;
        tracing::debug!(%room_id, joins = first_join.joins, "first join determined the room");

        let paused = options.paused;
        let handle = self.observe(&room_id, options).await?;
        if paused {
            handle.pause().await?;
        }
        for slot in 0..participants.len() {
            handle.set_timeout(slot, false).await?;
        }
        let _ = room_tx.send(room_id.clone());

        // Counted from the first join, so a join that lands before its
        // waiter is registered still satisfies it.
        for (n, participant) in rest.iter().enumerate() {
            let joined = self
                .registry
                .register_for_joins(&room_id, first_join.joins + n + 1);
            participant.join_any_game().await?;
            joined.await?;
        }
        Ok(())
    }

    /// Installs the room's handle, listeners, and game-over handler, then
    /// asks the server to let us observe it.
    async fn observe(
        &self,
        room_id: &RoomId,
        options: StartOptions,
    ) -> Result<SessionHandle, GameStartError> {
        let handle = SessionHandle::new(
            self.session.clone(),
            self.registry.clone(),
            room_id.clone(),
        );
        for listener in options.listeners {
            handle.add_listener(listener);
        }
        if let Some(handler) = options.on_game_over {
            handle.set_game_over_handler(handler);
        }
        *self
            .handle_slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle.clone());

        handle.observe().await?;
        tracing::info!(%room_id, "observing room");
        Ok(handle)
    }
}
