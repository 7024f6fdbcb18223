//! Error types for the lobby layer, and the unified error for the stack.

use lobbyist_protocol::ProtocolError;
use lobbyist_room::RoomError;
use lobbyist_session::SessionError;
use lobbyist_transport::TransportError;

/// Top-level error that wraps every crate-specific error.
///
/// The `#[from]` conversions let `?` lift any layer's error into this one.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Room(#[from] RoomError),

    #[error(transparent)]
    GameStart(#[from] GameStartError),

    /// An environment variable held a value that could not be used.
    #[error("invalid {var}: {message}")]
    Config { var: &'static str, message: String },
}

/// Why a game start did not complete.
#[derive(Debug, thiserror::Error)]
pub enum GameStartError {
    /// The server refused to prepare the game.
    #[error("failed to start game: {message}")]
    Rejected { message: String },

    /// The session failed while the start was running (timeout, closed).
    #[error(transparent)]
    Session(SessionError),

    /// The server handed out a different number of reservations than
    /// there are participants.
    #[error("expected {expected} reservations, got {got}")]
    ReservationMismatch { expected: usize, got: usize },

    #[error(transparent)]
    Participant(#[from] ParticipantError),

    #[error(transparent)]
    Room(#[from] RoomError),

    /// The start ended without a room ever being known.
    #[error("no room was created")]
    NoRoom,

    /// A later start on the same lobby replaced this one.
    #[error("superseded by a newer game start")]
    Superseded,

    /// The start protocol panicked, most likely inside a participant.
    #[error("game start panicked: {0}")]
    Panicked(String),
}

impl From<SessionError> for GameStartError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Rejected { message } => Self::Rejected { message },
            other => Self::Session(other),
        }
    }
}

/// A participant could not carry out a join.
#[derive(Debug, thiserror::Error)]
pub enum ParticipantError {
    #[error("participant {name}: {source}")]
    Session {
        name: String,
        #[source]
        source: SessionError,
    },

    #[error("participant {name}: {message}")]
    Failed { name: String, message: String },
}

/// A pending move request was cancelled (superseded or paused).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("move request cancelled")]
pub struct MoveCancelled;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let lobby_err: LobbyError = err.into();
        assert!(matches!(lobby_err, LobbyError::Transport(_)));
        assert!(lobby_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let lobby_err: LobbyError = err.into();
        assert!(matches!(lobby_err, LobbyError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error() {
        let lobby_err: LobbyError = RoomError::WaitCancelled.into();
        assert!(matches!(lobby_err, LobbyError::Room(_)));
    }

    #[test]
    fn test_rejection_keeps_server_message() {
        let err: GameStartError = SessionError::Rejected {
            message: "bad slot".into(),
        }
        .into();
        assert!(matches!(&err, GameStartError::Rejected { message } if message == "bad slot"));
        assert_eq!(err.to_string(), "failed to start game: bad slot");
    }

    #[test]
    fn test_other_session_errors_stay_session_errors() {
        let err: GameStartError = SessionError::Closed.into();
        assert!(matches!(err, GameStartError::Session(SessionError::Closed)));

        let lobby_err: LobbyError = err.into();
        assert!(matches!(lobby_err, LobbyError::GameStart(_)));
    }
}
