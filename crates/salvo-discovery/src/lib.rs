//! Server discovery for Salvo.
//!
//! Finds Battleship++ servers on the local network without knowing their
//! address: the [`DiscoveryService`] broadcasts a fixed challenge datagram
//! and collects the addresses that answer with the fixed acknowledgement.
//! It runs independently of any server connection.

mod config;
mod error;
mod registry;
mod service;

pub use config::DiscoveryConfig;
pub use error::DiscoveryError;
pub use registry::ServerRegistry;
pub use service::{DiscoveryHandle, DiscoveryService};
