/// Errors that can occur in the discovery service.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// The discovery socket could not be bound.
    #[error("failed to bind discovery socket: {0}")]
    Bind(#[source] std::io::Error),

    /// Broadcasting could not be enabled on the socket.
    #[error("failed to enable broadcast: {0}")]
    Broadcast(#[source] std::io::Error),

    /// The discovery loop has stopped.
    #[error("discovery service stopped")]
    Stopped,
}
