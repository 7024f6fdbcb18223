//! Game server session for Lobbyist.
//!
//! This crate owns the one connection a lobby client keeps to its game
//! server:
//!
//! 1. **Connecting**: [`Session::connect`] dials the server; failure is a
//!    [`SessionError::Connect`] and is fatal for the session.
//! 2. **Authenticating**: the secret comes from a [`CredentialProvider`].
//! 3. **Talking**: fire-and-forget [`Session::send`], correlated and
//!    time-bounded [`Session::request`], and one ordered [`EventStream`] of
//!    server-pushed events.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room layer (above)  ← dispatches events, sends room controls
//!     ↕
//! Session layer (this crate)  ← frames, correlation, connection state
//!     ↕
//! Protocol + Transport (below)  ← wire types, bytes
//! ```

mod auth;
mod config;
mod error;
mod session;

pub use auth::{
    CredentialProvider, EnvCredential, StaticCredential, DEFAULT_PASSWORD_VAR,
};
pub use config::{
    SessionConfig, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_REQUEST_TIMEOUT,
};
pub use error::SessionError;
pub use session::{EventStream, Session, SessionState};
