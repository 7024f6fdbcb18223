//! Control handle for one observed room.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lobbyist_protocol::{Request, RoomId};
use lobbyist_session::Session;

use crate::{GameOverHandler, RoomError, RoomListener, WaiterRegistry};

struct HandleInner {
    room_id: RoomId,
    session: Session,
    registry: WaiterRegistry,
    closed: AtomicBool,
}

/// Sends room-scoped commands and owns the room's registrations.
///
/// Cheap to clone; all clones control the same room. After
/// [`close`](Self::close) every command fails with
/// [`RoomError::HandleClosed`].
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<HandleInner>,
}

impl SessionHandle {
    /// Creates a handle for `room_id` without sending anything.
    pub fn new(session: Session, registry: WaiterRegistry, room_id: RoomId) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                room_id,
                session,
                registry,
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.inner.room_id
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Attaches a listener for this room's events.
    pub fn add_listener(&self, listener: Arc<dyn RoomListener>) {
        self.inner.registry.add_listener(&self.inner.room_id, listener);
    }

    /// Installs the handler invoked once when this room's game ends.
    pub fn set_game_over_handler(&self, handler: GameOverHandler) {
        self.inner
            .registry
            .set_game_over_handler(&self.inner.room_id, handler);
    }

    /// Starts observing the room.
    pub async fn observe(&self) -> Result<(), RoomError> {
        self.command(Request::Observe {
            room_id: self.inner.room_id.clone(),
        })
        .await
    }

    pub async fn pause(&self) -> Result<(), RoomError> {
        self.command(Request::Pause {
            room_id: self.inner.room_id.clone(),
        })
        .await
    }

    pub async fn resume(&self) -> Result<(), RoomError> {
        self.command(Request::Resume {
            room_id: self.inner.room_id.clone(),
        })
        .await
    }

    /// Enables or disables move timeouts for the player in `slot`.
    pub async fn set_timeout(&self, slot: usize, enabled: bool) -> Result<(), RoomError> {
        self.command(Request::ControlTimeout {
            room_id: self.inner.room_id.clone(),
            enabled,
            slot,
        })
        .await
    }

    /// Stops controlling the room and drops its listeners, handler, and
    /// room waiters. Idempotent.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.registry.release_room(&self.inner.room_id);
        tracing::debug!(room_id = %self.inner.room_id, "session handle closed");
    }

    async fn command(&self, request: Request) -> Result<(), RoomError> {
        if self.is_closed() {
            return Err(RoomError::HandleClosed(self.inner.room_id.clone()));
        }
        self.inner.session.send(request).await?;
        Ok(())
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("room_id", &self.inner.room_id)
            .field("closed", &self.is_closed())
            .finish()
    }
}
