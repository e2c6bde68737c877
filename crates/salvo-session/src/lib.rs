//! Client-side session logic for Salvo.
//!
//! This crate is the brain of the client. It has no I/O of its own:
//!
//! 1. **Dispatch** ([`dispatch`], [`ReportHandler`]): maps every status of
//!    the closed table to exactly one handler call.
//! 2. **State machine** ([`ClientSession`], [`ClientState`]): guards user
//!    operations, applies server events, and tracks pending requests with
//!    deadlines.
//! 3. **Lobby reconciliation** ([`Lobby`]): replaces the local lobby with
//!    each server snapshot and notices when an opponent joins or renames.
//! 4. **Notifications** ([`Notifier`]): one subscriber list per category.
//!
//! # How it fits in the stack
//!
//! ```text
//! Client actor (above)  ← owns the session, sends the requests it returns
//!     ↕
//! Session Layer (this crate)  ← decides what a report or an operation means
//!     ↕
//! Protocol Layer (below)  ← Report, StatusCode, LobbySnapshot, ClientRequest
//! ```

mod config;
mod dispatcher;
mod error;
mod lobby;
mod notify;
mod pending;
mod session;
mod state;

pub use config::SessionConfig;
pub use dispatcher::{RejectedAction, ReportHandler, dispatch};
pub use error::SessionError;
pub use lobby::{GameRole, Lobby, LobbyChange, OwnGame};
pub use notify::{FieldEvent, Notifier, Topic};
pub use pending::{PendingRequest, RequestKind, RequestOutcome};
pub use session::ClientSession;
pub use state::ClientState;
