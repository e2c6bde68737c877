//! Requests that wait for the server's answer.
//!
//! Every pending request has exactly one way out: the matching report
//! (success or rejection), an explicit leave/reset, or its deadline.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Which request is waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    Join,
    Create,
    Placement,
    Attack,
    SpecialAttack,
    Move,
    Surrender,
}

impl RequestKind {
    /// Lobby requests and in-game actions wait in separate slots.
    pub fn is_lobby(self) -> bool {
        matches!(self, Self::Join | Self::Create)
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Join => "join",
            Self::Create => "create",
            Self::Placement => "ship placement",
            Self::Attack => "attack",
            Self::SpecialAttack => "special attack",
            Self::Move => "move",
            Self::Surrender => "surrender",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub kind: RequestKind,
    pub deadline: Instant,
}

impl PendingRequest {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

/// How a request ended. Published on the outcome channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOutcome {
    pub kind: RequestKind,
    pub success: bool,
    /// The game name for join and create requests.
    pub game: Option<String>,
}

impl RequestOutcome {
    pub fn new(kind: RequestKind, success: bool) -> Self {
        Self {
            kind,
            success,
            game: None,
        }
    }

    pub fn for_game(mut self, game: impl Into<String>) -> Self {
        self.game = Some(game.into());
        self
    }
}
