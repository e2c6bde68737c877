//! Transport layer for Salvo.
//!
//! Provides the [`Connection`]: one persistent TCP stream to a server,
//! a framed `send` path, and a background receive loop that decodes
//! frames into [`Report`](salvo_protocol::Report)s and hands them to the
//! owner through an mpsc channel of [`Inbound`] events.

mod connection;
mod error;
mod frame;

pub use connection::{Connection, Inbound, InboundEvent};
pub use error::TransportError;
pub use frame::read_frame;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Names one outbound connection for the lifetime of the process.
///
/// Each [`Connection::connect`] draws a fresh id and the receive loop stamps
/// it on every [`Inbound`] event. After a reconnect the owner compares the
/// stamp with its current connection and drops events that the previous
/// socket delivered late. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub(crate) fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The sequence number, for logs and metrics labels.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_next_never_repeats() {
        let first = ConnectionId::next();
        let second = ConnectionId::next();
        assert_ne!(first, second);
        assert!(second.as_u64() > first.as_u64());
    }

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId(7).to_string(), "conn-7");
    }
}
