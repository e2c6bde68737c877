//! # Salvo
//!
//! Client core for the networked Battleship++ game.
//!
//! Salvo speaks the Battleship++ wire protocol over one persistent TCP
//! connection, drives a client-side state machine from the server's
//! status-coded reports, keeps a reconciled view of the lobby, and finds
//! servers on the local network through UDP broadcast discovery.
//!
//! The layers live in their own crates and are re-exported here:
//!
//! | Crate | Concern |
//! |---|---|
//! | `salvo-protocol` | messages, codecs, framing, status table |
//! | `salvo-transport` | TCP connection and receive loop |
//! | `salvo-session` | dispatcher, state machine, lobby reconciliation |
//! | `salvo-discovery` | broadcast discovery |
//! | `salvo-notify` | subscriber lists |
//!
//! [`SalvoClient`] ties them together behind a single actor task.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use salvo::prelude::*;
//!
//! # async fn example() -> Result<(), SalvoError> {
//! salvo::telemetry::init_tracing();
//!
//! let client = SalvoClient::builder().build();
//! let mut errors = client.subscribe_errors().await?;
//!
//! client.connect("192.168.0.10", 4000, "Ada").await?;
//! client.join_game("armada").await?;
//!
//! if let Some(error) = errors.recv().await {
//!     eprintln!("{error}");
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
pub mod telemetry;

pub use client::{ClientSnapshot, SalvoClient};
pub use config::{ClientConfig, SalvoClientBuilder};
pub use error::SalvoError;

pub use salvo_discovery as discovery;
pub use salvo_notify as notify;
pub use salvo_protocol as protocol;
pub use salvo_session as session;
pub use salvo_transport as transport;

/// Commonly used types, importable with `use salvo::prelude::*`.
pub mod prelude {
    pub use crate::{ClientConfig, ClientSnapshot, SalvoClient, SalvoClientBuilder, SalvoError};

    pub use salvo_discovery::{DiscoveryConfig, DiscoveryHandle, DiscoveryService};
    pub use salvo_notify::{Subscription, SubscriptionId};
    pub use salvo_protocol::{
        ChatMessage, Coordinate, Direction, GameRecord, LobbySnapshot, PlayerId, PlayerRecord,
        ShipPlacement,
    };
    pub use salvo_session::{
        ClientState, FieldEvent, RequestKind, RequestOutcome, SessionConfig, SessionError, Topic,
    };
}
