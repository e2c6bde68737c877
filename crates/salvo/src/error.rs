//! Unified error type for the Salvo client.

use salvo_discovery::DiscoveryError;
use salvo_protocol::ProtocolError;
use salvo_session::SessionError;
use salvo_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impls, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SalvoError {
    /// Connecting, sending or receiving failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A message could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The session refused the operation, or the server rejected it.
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// The client actor is gone (after `shutdown`).
    #[error("client stopped")]
    ClientStopped,
}
