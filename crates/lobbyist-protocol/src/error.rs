//! Error types for the protocol layer.
//!
//! A `ProtocolError` always means the bytes and the types disagreed. A
//! server refusing a request is not a protocol error here; that arrives as
//! a well-formed [`ResponseBody::Error`](crate::ResponseBody::Error).

/// Errors that can occur while encoding or decoding lobby frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing fields, or an
    /// unknown message kind.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame decoded but makes no sense, e.g. a response whose body
    /// does not match the request that was sent.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
