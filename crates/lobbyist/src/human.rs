//! Brokering moves between a game engine and a human at a UI.
//!
//! The engine asks for a move with [`MoveBroker::request`] and awaits the
//! returned [`MoveWait`]. The UI answers with [`MoveBroker::submit`]. If the
//! room pauses while a human is thinking, the wait is cancelled so the
//! engine is not left blocked on a move that will never come.
//!
//! At most one request is outstanding; asking again cancels the previous
//! one.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};

use lobbyist_protocol::RoomId;
use lobbyist_room::RoomListener;
use tokio::sync::oneshot;

use crate::MoveCancelled;

/// `Some(move)` for a move, `None` for skipping the turn.
pub type MoveOutcome<M> = Result<Option<M>, MoveCancelled>;

struct Pending<M> {
    id: u64,
    tx: oneshot::Sender<MoveOutcome<M>>,
}

struct BrokerState<M> {
    next_id: u64,
    pending: Option<Pending<M>>,
}

/// Hands one move at a time from a UI to whoever is waiting for it.
///
/// Cheap to clone; clones share the outstanding request. Attach a clone as
/// a room listener to cancel the wait when the room pauses.
pub struct MoveBroker<M> {
    state: Arc<Mutex<BrokerState<M>>>,
}

impl<M> Clone for MoveBroker<M> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<M> Default for MoveBroker<M> {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(BrokerState {
                next_id: 0,
                pending: None,
            })),
        }
    }
}

impl<M> MoveBroker<M> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BrokerState<M>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens a move request. A request still outstanding is cancelled.
    pub fn request(&self) -> MoveWait<M> {
        let (tx, rx) = oneshot::channel();
        let (id, previous) = {
            let mut state = self.lock();
            let id = state.next_id;
            state.next_id += 1;
            (id, state.pending.replace(Pending { id, tx }))
        };
        if let Some(previous) = previous {
            tracing::debug!(id = previous.id, "move request superseded");
            let _ = previous.tx.send(Err(MoveCancelled));
        }
        MoveWait {
            id,
            rx,
            broker: Arc::downgrade(&self.state),
            finished: false,
        }
    }

    /// Answers the outstanding request. Returns `false` if none was open.
    pub fn submit(&self, mv: Option<M>) -> bool {
        match self.take_pending() {
            Some(pending) => pending.tx.send(Ok(mv)).is_ok(),
            None => false,
        }
    }

    /// Cancels the outstanding request. Returns `false` if none was open.
    pub fn cancel(&self) -> bool {
        match self.take_pending() {
            Some(pending) => {
                tracing::debug!(id = pending.id, "move request cancelled");
                pending.tx.send(Err(MoveCancelled)).is_ok()
            }
            None => false,
        }
    }

    /// Whether a request is waiting for an answer.
    pub fn is_waiting(&self) -> bool {
        self.lock().pending.is_some()
    }

    fn take_pending(&self) -> Option<Pending<M>> {
        self.lock().pending.take()
    }
}

impl<M: Send + 'static> RoomListener for MoveBroker<M> {
    fn on_paused(&self, room_id: &RoomId, next_player: &str) {
        if self.cancel() {
            tracing::info!(%room_id, next_player, "room paused, pending move cancelled");
        }
    }
}

/// The engine's side of a move request.
///
/// Dropping it withdraws the request.
#[must_use = "a MoveWait does nothing unless awaited"]
pub struct MoveWait<M> {
    id: u64,
    rx: oneshot::Receiver<MoveOutcome<M>>,
    broker: Weak<Mutex<BrokerState<M>>>,
    finished: bool,
}

impl<M> Future for MoveWait<M> {
    type Output = MoveOutcome<M>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(outcome) => {
                this.finished = true;
                // A dropped sender means the broker went away.
                Poll::Ready(outcome.unwrap_or(Err(MoveCancelled)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<M> Drop for MoveWait<M> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Some(state) = self.broker.upgrade() {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.pending.as_ref().is_some_and(|p| p.id == self.id) {
                state.pending = None;
            }
        }
    }
}
