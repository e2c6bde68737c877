//! Inbound reports and the typed payloads some of them carry.

use serde::{Deserialize, Serialize};

use crate::lobby::PlayerId;
use crate::message::{Message, Params, parse_param, require};
use crate::{ProtocolError, StatusCode};

/// The parameter that carries the status code of a report.
pub const STATUS_KEY: &str = "status";

/// A server message whose status code is in the closed table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// The message type label the server used (usually `"report"`).
    pub kind: String,
    pub status: StatusCode,
    /// All parameters, including `status`.
    pub params: Params,
}

impl Report {
    pub fn new(status: StatusCode) -> Self {
        let mut params = Params::new();
        params.insert(STATUS_KEY.into(), status.code().to_string());
        Self {
            kind: "report".into(),
            status,
            params,
        }
    }

    /// Builder-style helper, mostly for fake servers and tests.
    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params.extend(params);
        self
    }

    pub fn into_message(self) -> Message {
        Message {
            kind: self.kind,
            params: self.params,
        }
    }
}

impl TryFrom<Message> for Report {
    type Error = ProtocolError;

    /// Extracts and classifies the status code.
    ///
    /// # Errors
    /// - [`ProtocolError::MissingParam`] / [`ProtocolError::InvalidParam`]
    ///   if `status` is absent or not a number.
    /// - [`ProtocolError::UnknownStatus`] if the code is not in the table.
    fn try_from(msg: Message) -> Result<Self, Self::Error> {
        let code: u16 = msg.parse_param(STATUS_KEY)?;
        let status = StatusCode::try_from(code)?;
        Ok(Self {
            kind: msg.kind,
            status,
            params: msg.params,
        })
    }
}

/// Which playing field a field update describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldSide {
    Own,
    Enemy,
}

/// A chat line relayed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub author: PlayerId,
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
    pub text: String,
}

impl ChatMessage {
    /// Parses the parameters of a `Chat_Broadcast` report.
    pub fn from_params(params: &Params) -> Result<Self, ProtocolError> {
        Ok(Self {
            author: PlayerId::new(require(params, "author_id")?),
            timestamp: parse_param(params, "timestamp")?,
            text: require(params, "message_content")?.to_string(),
        })
    }

    pub fn to_params(&self) -> Params {
        let mut params = Params::new();
        params.insert("author_id".into(), self.author.to_string());
        params.insert("timestamp".into(), self.timestamp.to_string());
        params.insert("message_content".into(), self.text.clone());
        params
    }
}

/// The winner field of a `Game_Ended` report: slot 0 is the player who
/// created the game, slot 1 the player who joined it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinnerSlot {
    Creator,
    Joiner,
}

impl WinnerSlot {
    pub fn from_params(params: &Params) -> Result<Self, ProtocolError> {
        match require(params, "winner")?.trim() {
            "0" => Ok(Self::Creator),
            "1" => Ok(Self::Joiner),
            other => Err(ProtocolError::InvalidParam {
                key: "winner".into(),
                value: other.to_string(),
            }),
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Creator => "0",
            Self::Joiner => "1",
        }
    }
}
