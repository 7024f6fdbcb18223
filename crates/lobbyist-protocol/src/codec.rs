//! Codec trait and the JSON implementation.
//!
//! The session layer only ever needs two things from an encoding: turn a
//! [`RequestFrame`](crate::RequestFrame) into bytes, and turn bytes into a
//! [`ServerFrame`](crate::ServerFrame). The [`Codec`] trait states exactly
//! that, generically, so a binary format could replace JSON without touching
//! the session.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes values to bytes and decodes them back.
///
/// `Send + Sync + 'static` because the session's reader and writer tasks
/// both hold on to the codec for the life of the connection.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` for malformed or mismatched input.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// ```rust
/// use lobbyist_protocol::{Codec, JsonCodec, Request, RequestFrame, RoomId};
///
/// let frame = RequestFrame {
///     id: 1,
///     request: Request::Resume { room_id: RoomId::from("room-1") },
/// };
/// let bytes = JsonCodec.encode(&frame).unwrap();
/// let decoded: RequestFrame = JsonCodec.decode(&bytes).unwrap();
/// assert_eq!(frame, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{LobbyEvent, RoomId, ServerFrame};

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let result: Result<ServerFrame, _> = JsonCodec.decode(b"{not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_unknown_event_kind_fails() {
        let bytes = br#"{"type":"Event","data":{"type":"Teleported","room_id":"x"}}"#;
        let result: Result<ServerFrame, _> = JsonCodec.decode(bytes);
        assert!(result.is_err());
    }

    #[test]
    fn test_encoded_event_is_json_text() {
        let frame = ServerFrame::Event(LobbyEvent::GameLeft {
            room_id: RoomId::from("room-2"),
        });
        let bytes = JsonCodec.encode(&frame).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\"GameLeft\""));
        assert!(text.contains("\"room-2\""));
    }
}
