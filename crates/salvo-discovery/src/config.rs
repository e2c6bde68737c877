use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the discovery loop.
///
/// The defaults speak the Battleship++ discovery protocol: a challenge
/// broadcast to port 12345 on the local network, answered by every server
/// with a fixed acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// The port servers listen on for challenges.
    pub port: u16,

    /// Where challenges are sent. Tests point this at loopback.
    pub broadcast_addr: IpAddr,

    /// The local address the discovery socket binds to.
    pub bind_addr: SocketAddr,

    /// How long each cycle listens for answers before broadcasting again.
    pub listen_window: Duration,

    /// The challenge payload.
    pub challenge: String,

    /// The payload a server answers with. Anything else is ignored.
    pub acknowledgement: String,

    /// Upper bound of the random delay before the first broadcast, so
    /// clients started together do not broadcast in lockstep.
    pub initial_jitter: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            port: 12345,
            broadcast_addr: IpAddr::V4(Ipv4Addr::BROADCAST),
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            listen_window: Duration::from_secs(2),
            challenge: "I_NEED_A_BATTLESHIP_PLUS_PLUS_SERVER".into(),
            acknowledgement: "I_AM_A_BATTLESHIP_PLUS_PLUS_SERVER".into(),
            initial_jitter: Duration::from_millis(250),
        }
    }
}

impl DiscoveryConfig {
    /// The address challenges are sent to.
    pub fn target(&self) -> SocketAddr {
        SocketAddr::new(self.broadcast_addr, self.port)
    }
}
