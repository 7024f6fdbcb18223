//! Lobby wire protocol for Lobbyist.
//!
//! This crate defines what a lobby client and a game server say to each
//! other:
//!
//! - **Types** ([`Request`], [`ResponseBody`], [`LobbyEvent`], etc.): the
//!   frames that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how frames become bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong while converting.
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (RequestFrame / ServerFrame) → Session
//! ```
//!
//! The protocol layer knows nothing about connections or waiting; it only
//! serializes and deserializes.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    GamePrepared, GameResult, GameType, LobbyEvent, PlayerScore, Request,
    RequestFrame, ReservationToken, Response, ResponseBody, RoomId,
    ScoreCause, ServerFrame, SlotDescriptor,
};
