//! Error types for the room layer.

use lobbyist_protocol::RoomId;
use lobbyist_session::SessionError;

/// Errors that can occur while waiting on or controlling rooms.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The join waiter was dropped by the registry before any join
    /// arrived, e.g. because its room was released.
    #[error("join wait cancelled")]
    WaitCancelled,

    /// The handle for this room was closed; it no longer controls it.
    #[error("handle for room {0} is closed")]
    HandleClosed(RoomId),

    /// The callback worker has shut down.
    #[error("callback worker stopped")]
    WorkerStopped,

    /// Sending a room command failed.
    #[error(transparent)]
    Session(#[from] SessionError),
}
