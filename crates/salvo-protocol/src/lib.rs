//! Wire protocol for Salvo.
//!
//! This crate defines the "language" the client and a Battleship++ server speak:
//!
//! - **Messages** ([`Message`], [`Params`]): a type label plus a map of
//!   string parameters.
//! - **Codecs** ([`Codec`] trait, [`TextCodec`], [`JsonCodec`]): how a
//!   message body is turned into bytes and back.
//! - **Framing** ([`encode_frame`], [`body_len`]): the 2-byte big-endian
//!   length prefix that delimits messages on the stream.
//! - **Reports** ([`Report`], [`StatusCode`]): inbound server messages and
//!   the closed status table that classifies them.
//! - **Payloads** ([`LobbySnapshot`], [`ChatMessage`], [`ClientRequest`]):
//!   typed views over report parameters and outbound requests.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about sockets or sessions. It only
//! knows how to build, encode, and decode messages.
//!
//! ```text
//! Transport (bytes) → Protocol (Message / Report) → Session (state machine)
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod codec;
mod error;
mod frame;
mod lobby;
mod message;
mod report;
mod request;
mod status;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use codec::{Codec, TextCodec};
pub use error::ProtocolError;
pub use frame::{LENGTH_PREFIX_LEN, MAX_BODY_LEN, body_len, encode_frame, frame_body};
pub use lobby::{GameRecord, LobbySnapshot, PlayerId, PlayerRecord};
pub use message::{Message, Params};
pub use report::{ChatMessage, FieldSide, Report, STATUS_KEY, WinnerSlot};
pub use request::{ClientRequest, Coordinate, Direction, ShipPlacement};
pub use status::StatusCode;
