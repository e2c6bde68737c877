//! Reading whole frames off a byte stream.

use std::io::ErrorKind;

use salvo_protocol::{LENGTH_PREFIX_LEN, body_len};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::TransportError;

/// Reads exactly one frame and returns its body.
///
/// Both the prefix and the body are read with `read_exact`, so a frame
/// split across several TCP segments is reassembled. The peer closing the
/// stream before or inside a frame is reported as
/// [`TransportError::ConnectionClosed`].
pub async fn read_frame<R>(reader: &mut R) -> Result<Vec<u8>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; LENGTH_PREFIX_LEN];
    reader
        .read_exact(&mut prefix)
        .await
        .map_err(|e| map_read_error(e, "peer closed the connection"))?;

    let mut body = vec![0u8; body_len(prefix)];
    reader
        .read_exact(&mut body)
        .await
        .map_err(|e| map_read_error(e, "connection closed mid-frame"))?;

    Ok(body)
}

fn map_read_error(err: std::io::Error, eof_reason: &str) -> TransportError {
    if err.kind() == ErrorKind::UnexpectedEof {
        TransportError::ConnectionClosed(eof_reason.to_string())
    } else {
        TransportError::ReceiveFailed(err)
    }
}
