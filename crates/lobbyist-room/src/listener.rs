//! Callbacks the application attaches to an observed room.

use lobbyist_protocol::{GameResult, RoomId};

/// Receives the state updates of one observed room.
///
/// Every method has an empty default, so implementors only override the
/// events they care about. Methods run on the callback worker, never on the
/// dispatch task, and a panic in one call is contained to that call.
pub trait RoomListener: Send + Sync + 'static {
    /// A new game state arrived.
    fn on_new_state(&self, _room_id: &RoomId, _state: &[u8]) {}

    /// The server reported a room-scoped error.
    fn on_error(&self, _room_id: &RoomId, _message: &str) {}

    /// A room message without a dedicated kind arrived.
    fn on_room_message(&self, _room_id: &RoomId, _payload: &[u8]) {}

    /// A client left the room.
    fn on_game_left(&self, _room_id: &RoomId) {}

    /// The room was paused; `next_player` moves once it resumes.
    fn on_paused(&self, _room_id: &RoomId, _next_player: &str) {}

    /// Observation of the room started.
    fn on_observed(&self, _room_id: &RoomId) {}
}

/// Invoked once with the result when a room's game ends.
pub type GameOverHandler = Box<dyn FnOnce(GameResult) + Send + 'static>;
