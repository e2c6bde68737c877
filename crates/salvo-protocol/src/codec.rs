//! Codec trait and implementations for message bodies.
//!
//! A codec turns a [`Message`] into the body bytes that sit behind the
//! length prefix, and back. The rest of the stack only depends on the
//! [`Codec`] trait, so the body syntax can be swapped without touching
//! the connection or the session.
//!
//! - [`TextCodec`] is the Battleship++ wire syntax and the default.
//! - [`JsonCodec`] (feature `json`) encodes the same message as a JSON
//!   object, which is handy against test servers and for debugging.

use crate::message::{Message, Params};
use crate::ProtocolError;

/// A codec that can encode messages to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because the codec is shared between the
/// caller's task (encoding outbound requests) and the receive loop
/// (decoding inbound reports).
///
/// Contract: `decode(&encode(m)?)? == m` for every message that passes
/// [`Message::validate`].
pub trait Codec: Send + Sync + 'static {
    /// Encodes a message body.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the message violates the
    /// message invariants.
    fn encode(&self, msg: &Message) -> Result<Vec<u8>, ProtocolError>;

    /// Decodes a message body.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the body is malformed.
    fn decode(&self, data: &[u8]) -> Result<Message, ProtocolError>;
}

// ---------------------------------------------------------------------------
// TextCodec
// ---------------------------------------------------------------------------

/// The key of the first field of every text body.
const TYPE_KEY: &str = "type";

/// The Battleship++ text syntax.
///
/// A body is UTF-8 text made of `key:value;` fields. The first field is
/// always `type:<label>;`, the remaining fields are the parameters:
///
/// ```text
/// type:game_join;name:friday\:night;
/// ```
///
/// Inside keys and values, `\`, `:` and `;` are escaped with a backslash.
///
/// ## Example
///
/// ```rust
/// use salvo_protocol::{Codec, Message, TextCodec};
///
/// let msg = Message::new("chat_send").with_param("text", "gg; wp");
/// let bytes = TextCodec.encode(&msg).unwrap();
/// assert_eq!(bytes, b"type:chat_send;text:gg\\; wp;");
/// assert_eq!(TextCodec.decode(&bytes).unwrap(), msg);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl Codec for TextCodec {
    fn encode(&self, msg: &Message) -> Result<Vec<u8>, ProtocolError> {
        msg.validate()?;

        let mut out = String::new();
        push_field(&mut out, TYPE_KEY, &msg.kind);
        for (key, value) in &msg.params {
            push_field(&mut out, key, value);
        }
        Ok(out.into_bytes())
    }

    fn decode(&self, data: &[u8]) -> Result<Message, ProtocolError> {
        let text = std::str::from_utf8(data).map_err(|e| {
            ProtocolError::Decode(format!("body is not valid UTF-8: {e}"))
        })?;

        let mut fields = split_fields(text)?.into_iter();

        let (key, kind) = fields
            .next()
            .ok_or_else(|| ProtocolError::Decode("empty body".into()))?;
        if key != TYPE_KEY {
            return Err(ProtocolError::Decode(format!(
                "first field must be `{TYPE_KEY}`, found `{key}`"
            )));
        }
        if kind.is_empty() {
            return Err(ProtocolError::Decode("empty message type".into()));
        }

        let mut params = Params::new();
        for (key, value) in fields {
            if params.contains_key(&key) {
                return Err(ProtocolError::Decode(format!(
                    "duplicate parameter `{key}`"
                )));
            }
            params.insert(key, value);
        }

        Ok(Message { kind, params })
    }
}

fn push_field(out: &mut String, key: &str, value: &str) {
    push_escaped(out, key);
    out.push(':');
    push_escaped(out, value);
    out.push(';');
}

fn push_escaped(out: &mut String, raw: &str) {
    for c in raw.chars() {
        if matches!(c, '\\' | ':' | ';') {
            out.push('\\');
        }
        out.push(c);
    }
}

/// Splits a text body into unescaped `(key, value)` pairs.
fn split_fields(text: &str) -> Result<Vec<(String, String)>, ProtocolError> {
    let mut fields = Vec::new();
    let mut key = String::new();
    let mut value = String::new();
    let mut in_value = false;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escaped = chars.next().ok_or_else(|| {
                    ProtocolError::Decode("dangling escape at end of body".into())
                })?;
                if in_value {
                    value.push(escaped);
                } else {
                    key.push(escaped);
                }
            }
            ':' if !in_value => in_value = true,
            ':' => {
                return Err(ProtocolError::Decode(format!(
                    "unescaped `:` in value of `{key}`"
                )));
            }
            ';' => {
                if !in_value {
                    return Err(ProtocolError::Decode(format!(
                        "field `{key}` has no `:` separator"
                    )));
                }
                fields.push((std::mem::take(&mut key), std::mem::take(&mut value)));
                in_value = false;
            }
            _ if in_value => value.push(c),
            _ => key.push(c),
        }
    }

    if in_value || !key.is_empty() {
        return Err(ProtocolError::Decode(format!(
            "unterminated field `{key}`"
        )));
    }

    Ok(fields)
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that encodes the body as a JSON object:
///
/// ```text
/// {"type":"game_join","params":{"name":"friday"}}
/// ```
///
/// Behind the `json` feature flag (enabled by default).
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode(&self, msg: &Message) -> Result<Vec<u8>, ProtocolError> {
        msg.validate()?;
        serde_json::to_vec(msg).map_err(ProtocolError::Json)
    }

    fn decode(&self, data: &[u8]) -> Result<Message, ProtocolError> {
        let msg: Message =
            serde_json::from_slice(data).map_err(ProtocolError::Json)?;
        if msg.kind.is_empty() {
            return Err(ProtocolError::Decode("empty message type".into()));
        }
        Ok(msg)
    }
}
