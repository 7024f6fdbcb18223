//! Error types for the session layer.

use std::time::Duration;

use lobbyist_protocol::ProtocolError;
use lobbyist_transport::TransportError;

/// Errors that can occur while talking to the game server.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The server could not be reached. Fatal for the session; the caller
    /// decides whether to abort.
    #[error("could not connect to server: {0}")]
    Connect(#[source] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// No response arrived within the configured request timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The server answered a request with an error.
    #[error("request rejected by server: {message}")]
    Rejected {
        /// The server's error message, unchanged.
        message: String,
    },

    /// The connection is gone; nothing more can be sent or received.
    #[error("session closed")]
    Closed,

    /// The credential provider had no secret to hand out.
    #[error("no credential available: {0}")]
    MissingCredential(String),
}
