//! Waiter registry: who is waiting for which room.
//!
//! The registry is the one piece of state shared between the dispatch
//! task (events arriving) and orchestration code (new registrations). All
//! of it sits behind a single mutex that is never held across an await or
//! while user code runs:
//!
//! - **join waiters**: one-shot completions for "room R has seen N joins"
//!   or "the next join anywhere" (wildcard);
//! - **join counters**: how many joins were seen per room;
//! - **game-over handlers**: at most one per room;
//! - **listeners**: per-room [`RoomListener`]s.
//!
//! A waiter is removed from the registry in the same critical section that
//! decides to fire it, so it can fire at most once and a registration can
//! never slip between two halves of a resolution.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};

use lobbyist_protocol::RoomId;
use tokio::sync::oneshot;

use crate::{GameOverHandler, RoomError, RoomListener};

/// What a resolved [`JoinWait`] reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joined {
    pub room_id: RoomId,
    /// The room's join count when the waiter fired, this join included.
    pub joins: usize,
}

struct Waiter {
    id: u64,
    /// Room waiters fire once the room's count reaches this. Ignored for
    /// wildcards.
    min_joins: usize,
    tx: oneshot::Sender<Joined>,
}

#[derive(Default)]
struct RegistryState {
    next_id: u64,
    any: Vec<Waiter>,
    rooms: HashMap<RoomId, Vec<Waiter>>,
    joins: HashMap<RoomId, usize>,
    game_over: HashMap<RoomId, GameOverHandler>,
    listeners: HashMap<RoomId, Vec<Arc<dyn RoomListener>>>,
}

impl RegistryState {
    fn joins(&self, room_id: &RoomId) -> usize {
        self.joins.get(room_id).copied().unwrap_or(0)
    }

    fn push_waiter(
        &mut self,
        target: Option<&RoomId>,
        min_joins: usize,
    ) -> (u64, oneshot::Receiver<Joined>) {
        let id = self.next_id;
        self.next_id += 1;
        let (tx, rx) = oneshot::channel();

        match target {
            Some(room) => {
                let joins = self.joins(room);
                if joins >= min_joins {
                    // Already reached: resolve without registering.
                    let _ = tx.send(Joined {
                        room_id: room.clone(),
                        joins,
                    });
                } else {
                    let waiter = Waiter { id, min_joins, tx };
                    self.rooms.entry(room.clone()).or_default().push(waiter);
                }
            }
            None => self.any.push(Waiter { id, min_joins: 0, tx }),
        }
        (id, rx)
    }

    fn remove_waiter(&mut self, id: u64, target: Option<&RoomId>) {
        match target {
            Some(room) => {
                if let Some(list) = self.rooms.get_mut(room) {
                    list.retain(|w| w.id != id);
                    if list.is_empty() {
                        self.rooms.remove(room);
                    }
                }
            }
            None => self.any.retain(|w| w.id != id),
        }
    }
}

/// Shared registry of join waiters, counters, handlers, and listeners.
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone, Default)]
pub struct WaiterRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl WaiterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits for the next join event in any room.
    ///
    /// The first join event after this call resolves it, whatever the room.
    pub fn register_any(&self) -> JoinWait {
        let (id, rx) = self.lock().push_waiter(None, 0);
        JoinWait::new(id, None, rx, Arc::downgrade(&self.state))
    }

    /// Waits for the next join event in `room_id`.
    pub fn register_for_room(&self, room_id: &RoomId) -> JoinWait {
        let (id, rx) = {
            let mut state = self.lock();
            let next = state.joins(room_id) + 1;
            state.push_waiter(Some(room_id), next)
        };
        self.room_wait(id, room_id, rx)
    }

    /// Waits until `room_id` has seen at least `min_joins` joins.
    ///
    /// Resolves immediately if the count is already there, so joins that
    /// arrived before the call are never missed.
    pub fn register_for_joins(&self, room_id: &RoomId, min_joins: usize) -> JoinWait {
        let (id, rx) = self.lock().push_waiter(Some(room_id), min_joins);
        self.room_wait(id, room_id, rx)
    }

    fn room_wait(
        &self,
        id: u64,
        room_id: &RoomId,
        rx: oneshot::Receiver<Joined>,
    ) -> JoinWait {
        JoinWait::new(
            id,
            Some(room_id.clone()),
            rx,
            Arc::downgrade(&self.state),
        )
    }

    /// Records a join in `room_id` and resolves every matching waiter.
    ///
    /// Matching means the waiters for `room_id` whose count is now
    /// reached plus every pending wildcard waiter. They are removed, then
    /// completed in registration order. Returns how many waiting futures
    /// were woken.
    pub fn resolve_join(&self, room_id: &RoomId) -> usize {
        let (mut gathered, joins) = {
            let mut state = self.lock();
            let joins = {
                let count = state.joins.entry(room_id.clone()).or_insert(0);
                *count += 1;
                *count
            };
            let mut gathered = Vec::new();
            if let Some(list) = state.rooms.remove(room_id) {
                let (ready, waiting): (Vec<_>, Vec<_>) =
                    list.into_iter().partition(|w| w.min_joins <= joins);
                gathered = ready;
                if !waiting.is_empty() {
                    state.rooms.insert(room_id.clone(), waiting);
                }
            }
            gathered.append(&mut state.any);
            (gathered, joins)
        };
        gathered.sort_by_key(|w| w.id);

        gathered
            .into_iter()
            .filter(|w| !w.tx.is_closed())
            .map(|w| {
                w.tx.send(Joined {
                    room_id: room_id.clone(),
                    joins,
                })
                .is_ok()
            })
            .filter(|delivered| *delivered)
            .count()
    }

    /// Number of joins seen in `room_id`, or in all rooms for `None`.
    pub fn joins_in_room(&self, room_id: Option<&RoomId>) -> usize {
        let state = self.lock();
        match room_id {
            Some(room) => state.joins(room),
            None => state.joins.values().sum(),
        }
    }

    /// Number of waiters still registered (wildcard and per-room).
    pub fn pending_waiters(&self) -> usize {
        let state = self.lock();
        state.any.len() + state.rooms.values().map(Vec::len).sum::<usize>()
    }

    /// Installs the game-over handler for `room_id`, replacing any
    /// previous one.
    pub fn set_game_over_handler(&self, room_id: &RoomId, handler: GameOverHandler) {
        let replaced = self.lock().game_over.insert(room_id.clone(), handler);
        if replaced.is_some() {
            tracing::debug!(%room_id, "replaced game-over handler");
        }
    }

    /// Removes and returns the game-over handler for `room_id`.
    pub fn take_game_over_handler(&self, room_id: &RoomId) -> Option<GameOverHandler> {
        self.lock().game_over.remove(room_id)
    }

    /// Attaches a listener to `room_id`.
    pub fn add_listener(&self, room_id: &RoomId, listener: Arc<dyn RoomListener>) {
        self.lock()
            .listeners
            .entry(room_id.clone())
            .or_default()
            .push(listener);
    }

    /// Snapshot of the listeners attached to `room_id`.
    pub fn listeners(&self, room_id: &RoomId) -> Vec<Arc<dyn RoomListener>> {
        self.lock()
            .listeners
            .get(room_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Forgets everything registered for `room_id` except its join count.
    ///
    /// Pending waits for the room resolve with [`RoomError::WaitCancelled`].
    /// Wildcard waiters are left alone.
    pub fn release_room(&self, room_id: &RoomId) {
        let (waiters, listeners, handler) = {
            let mut state = self.lock();
            (
                state.rooms.remove(room_id),
                state.listeners.remove(room_id),
                state.game_over.remove(room_id),
            )
        };
        // Dropped outside the lock: a listener's destructor may itself
        // touch the registry.
        drop((waiters, listeners, handler));
        tracing::debug!(%room_id, "room released from registry");
    }
}

// ---------------------------------------------------------------------------
// JoinWait
// ---------------------------------------------------------------------------

/// A pending join waiter. Resolves with the room joined and its count.
///
/// Dropping it before it resolves deregisters it, so an abandoned wait
/// leaves nothing behind in the registry.
#[must_use = "a JoinWait does nothing unless awaited"]
pub struct JoinWait {
    id: u64,
    target: Option<RoomId>,
    rx: oneshot::Receiver<Joined>,
    registry: Weak<Mutex<RegistryState>>,
    finished: bool,
}

impl JoinWait {
    fn new(
        id: u64,
        target: Option<RoomId>,
        rx: oneshot::Receiver<Joined>,
        registry: Weak<Mutex<RegistryState>>,
    ) -> Self {
        Self {
            id,
            target,
            rx,
            registry,
            finished: false,
        }
    }

    /// The room this waiter is bound to; `None` for a wildcard.
    pub fn target(&self) -> Option<&RoomId> {
        self.target.as_ref()
    }
}

impl Future for JoinWait {
    type Output = Result<Joined, RoomError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(result) => {
                this.finished = true;
                Poll::Ready(result.map_err(|_| RoomError::WaitCancelled))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for JoinWait {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Some(state) = self.registry.upgrade() {
            state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove_waiter(self.id, self.target.as_ref());
        }
    }
}
