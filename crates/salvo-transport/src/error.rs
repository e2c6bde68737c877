use salvo_protocol::ProtocolError;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Opening the stream to the server failed.
    #[error("failed to connect to {addr}: {source}")]
    ConnectFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// There is no active connection to send on.
    #[error("not connected")]
    NotConnected,

    /// The peer closed the connection (cleanly or mid-frame).
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Writing a frame failed. The connection should be treated as lost.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Reading a frame failed. The connection should be treated as lost.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// The outbound message could not be framed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
