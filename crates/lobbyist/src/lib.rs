//! # Lobbyist
//!
//! Client-side lobby orchestration for turn-based game servers.
//!
//! A [`Lobby`] keeps one authenticated session to the server, starts games
//! for a set of [`Participant`]s, and routes what the server pushes back
//! (joins, state updates, game over) to the code waiting for it.
//!
//! Games start one of two ways:
//!
//! - **prepared**: the server reserves one slot per participant and each
//!   participant joins with its reservation;
//! - **open**: participants join through matchmaking, strictly one after
//!   the other, and the first join tells us the room.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lobbyist::prelude::*;
//!
//! # async fn run() -> Result<(), LobbyError> {
//! let lobby = Lobby::connect(LobbyConfig::default(), &StaticCredential::new("secret")).await?;
//! let players: Vec<Arc<dyn Participant>> = vec![Arc::new(ExternalParticipant::new("One"))];
//! let start = lobby
//!     .start_new_game(players, StartOptions::open().on_game_over(|r| println!("{r:?}")))
//!     .await;
//! start.started().await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod human;
mod lobby;
mod participant;
mod start;

pub use config::{
    LobbyConfig, DEFAULT_GAME_TYPE, GAME_TYPE_VAR, HOST_VAR, PORT_VAR,
    REQUEST_TIMEOUT_VAR,
};
pub use error::{GameStartError, LobbyError, MoveCancelled, ParticipantError};
pub use human::{MoveBroker, MoveOutcome, MoveWait};
pub use lobby::Lobby;
pub use participant::{ClientParticipant, ExternalParticipant, Participant};
pub use start::{GameStart, StartOptions};

/// Re-exports of the layer crates.
pub use lobbyist_protocol as protocol;
pub use lobbyist_room as room;
pub use lobbyist_session as session;
pub use lobbyist_transport as transport;

/// Everything needed to start games, in one import.
pub mod prelude {
    pub use crate::{
        ClientParticipant, ExternalParticipant, GameStart, GameStartError,
        Lobby, LobbyConfig, LobbyError, MoveBroker, MoveCancelled,
        Participant, ParticipantError, StartOptions,
    };
    pub use lobbyist_protocol::{GameResult, GameType, ReservationToken, RoomId};
    pub use lobbyist_room::{RoomListener, SessionHandle};
    pub use lobbyist_session::{
        CredentialProvider, EnvCredential, Session, SessionConfig,
        StaticCredential,
    };
}
