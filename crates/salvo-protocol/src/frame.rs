//! Length-prefixed framing.
//!
//! Every message on the stream is a frame:
//!
//! ```text
//! ┌──────────────┬──────────────────────────────┐
//! │ len: u16 BE  │ body: `len` bytes (codec)    │
//! └──────────────┴──────────────────────────────┘
//! ```
//!
//! Encoding lives here; reading frames off a socket belongs to the
//! transport, which only needs [`body_len`] to size the body read.

use crate::{Codec, Message, ProtocolError};

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_LEN: usize = 2;

/// Largest body a 2-byte prefix can describe.
pub const MAX_BODY_LEN: usize = u16::MAX as usize;

/// Encodes a message with `codec` and prepends the length prefix.
///
/// # Errors
/// Propagates codec errors, and returns [`ProtocolError::FrameTooLarge`]
/// if the body exceeds [`MAX_BODY_LEN`].
pub fn encode_frame<C: Codec + ?Sized>(
    codec: &C,
    msg: &Message,
) -> Result<Vec<u8>, ProtocolError> {
    let body = codec.encode(msg)?;
    frame_body(&body)
}

/// Prepends the length prefix to an already encoded body.
///
/// # Errors
/// Returns [`ProtocolError::FrameTooLarge`] if the body exceeds
/// [`MAX_BODY_LEN`].
pub fn frame_body(body: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let len = u16::try_from(body.len())
        .map_err(|_| ProtocolError::FrameTooLarge { len: body.len() })?;

    let mut frame = Vec::with_capacity(LENGTH_PREFIX_LEN + body.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(body);
    Ok(frame)
}

/// Interprets a length prefix.
pub fn body_len(prefix: [u8; LENGTH_PREFIX_LEN]) -> usize {
    usize::from(u16::from_be_bytes(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextCodec;

    #[test]
    fn test_frame_body_prefix_is_big_endian_length() {
        let frame = frame_body(&[0xaa; 300]).unwrap();
        // 300 = 0x012c
        assert_eq!(&frame[..2], &[0x01, 0x2c]);
        assert_eq!(frame.len(), 302);
    }

    #[test]
    fn test_frame_body_accepts_exact_maximum() {
        let frame = frame_body(&vec![b'x'; MAX_BODY_LEN]).unwrap();
        assert_eq!(&frame[..2], &[0xff, 0xff]);
    }

    #[test]
    fn test_frame_body_over_maximum_is_rejected() {
        let err = frame_body(&vec![b'x'; MAX_BODY_LEN + 1]).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::FrameTooLarge { len } if len == MAX_BODY_LEN + 1
        ));
    }

    #[test]
    fn test_encode_frame_oversized_chat_is_rejected() {
        let msg = Message::new("chat_send").with_param("text", "a".repeat(70_000));
        assert!(matches!(
            encode_frame(&TextCodec, &msg),
            Err(ProtocolError::FrameTooLarge { .. })
        ));
    }

    #[test]
    fn test_encode_frame_body_decodes_back() {
        let msg = Message::new("game_create").with_param("name", "armada");
        let frame = encode_frame(&TextCodec, &msg).unwrap();

        let len = body_len([frame[0], frame[1]]);
        assert_eq!(len, frame.len() - LENGTH_PREFIX_LEN);
        assert_eq!(TextCodec.decode(&frame[LENGTH_PREFIX_LEN..]).unwrap(), msg);
    }
}
