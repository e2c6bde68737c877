//! Error types for the protocol layer.
//!
//! Each Salvo crate defines its own error enum. A `ProtocolError` always
//! means the problem is in the shape of a message (encoding, decoding,
//! framing, or a missing parameter), never in the network or the session.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A message could not be encoded (e.g. it has an empty type label).
    #[error("encode failed: {0}")]
    Encode(String),

    /// A body could not be decoded: bad UTF-8, a field without a `:`
    /// separator, a dangling escape, a duplicate key, and so on.
    ///
    /// Callers treat this as a dropped message, not a fatal fault.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The JSON codec failed in either direction.
    #[cfg(feature = "json")]
    #[error("json codec failed: {0}")]
    Json(#[source] serde_json::Error),

    /// The encoded body does not fit behind a 2-byte length prefix.
    #[error("frame body of {len} bytes exceeds the {max} byte limit", max = crate::MAX_BODY_LEN)]
    FrameTooLarge { len: usize },

    /// A required parameter is absent from a message.
    #[error("missing parameter `{0}`")]
    MissingParam(String),

    /// A parameter is present but its value cannot be interpreted.
    #[error("invalid value `{value}` for parameter `{key}`")]
    InvalidParam { key: String, value: String },

    /// The status code is a valid wire value but not part of the closed
    /// status table. Not actionable; callers log and drop it.
    #[error("unknown status code {0}")]
    UnknownStatus(u16),

    /// The message is well-formed but violates a protocol rule.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
