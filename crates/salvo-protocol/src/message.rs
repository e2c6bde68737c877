//! The message model: a type label plus string parameters.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// The parameters of a message.
///
/// Parameter order carries no meaning on the wire. A `BTreeMap` keeps keys
/// unique and gives every message one canonical encoding, which keeps logs
/// and tests stable.
pub type Params = BTreeMap<String, String>;

/// One protocol message.
///
/// Invariants: `kind` is non-empty (checked by [`Message::validate`], which
/// every codec calls before encoding) and parameter keys are unique (the map
/// guarantees it).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Message {
    /// The message type label, e.g. `"game_join"` or `"report"`.
    #[serde(rename = "type")]
    pub kind: String,

    /// String parameters keyed by name.
    #[serde(default)]
    pub params: Params,
}

impl Message {
    /// Creates a message with no parameters.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: Params::new(),
        }
    }

    /// Builder-style helper that adds (or replaces) one parameter.
    pub fn with_param(
        mut self,
        key: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Returns a parameter value, if present.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Returns a parameter value or [`ProtocolError::MissingParam`].
    pub fn require(&self, key: &str) -> Result<&str, ProtocolError> {
        require(&self.params, key)
    }

    /// Parses a required parameter into any `FromStr` type.
    pub fn parse_param<T: FromStr>(
        &self,
        key: &str,
    ) -> Result<T, ProtocolError> {
        parse_param(&self.params, key)
    }

    /// Checks the message invariants.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the type label is empty.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.kind.is_empty() {
            return Err(ProtocolError::Encode(
                "message type must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Looks up a required key in a parameter map.
pub(crate) fn require<'a>(
    params: &'a Params,
    key: &str,
) -> Result<&'a str, ProtocolError> {
    params
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| ProtocolError::MissingParam(key.to_string()))
}

/// Looks up and parses a required key in a parameter map.
pub(crate) fn parse_param<T: FromStr>(
    params: &Params,
    key: &str,
) -> Result<T, ProtocolError> {
    let raw = require(params, key)?;
    raw.trim().parse().map_err(|_| ProtocolError::InvalidParam {
        key: key.to_string(),
        value: raw.to_string(),
    })
}
