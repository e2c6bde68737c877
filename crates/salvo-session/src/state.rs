//! The client state machine's states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where the client currently stands.
///
/// ```text
///  NotConnected ──connect──→ NoGameRunning ──join/create accepted──→ Preparations
///                                 ↑                                     │ board sent
///                                 │ leave / abort                       ↓
///                                 │                              WaitingForOpponent
///                                 │                                     │ preparations ended
///                                 │                                     ↓
///                                 │          OwnTurn ←──begin turn── PreparationsEnded
///                                 │            │  ↑
///                                 │   accepted │  │ begin turn
///                                 │            ↓  │
///                                 │         OpponentsTurn
///                                 │
///                                 └──────── YouWin / YouLose (game ended, surrender)
/// ```
///
/// Disconnect and reset lead back to `NotConnected` from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClientState {
    #[default]
    NotConnected,
    NoGameRunning,
    Preparations,
    WaitingForOpponent,
    PreparationsEnded,
    OwnTurn,
    OpponentsTurn,
    YouWin,
    YouLose,
}

impl ClientState {
    pub fn is_connected(self) -> bool {
        !matches!(self, Self::NotConnected)
    }

    /// Returns `true` while the client is part of a game, including the
    /// finished states where the result is still on screen.
    pub fn in_game(self) -> bool {
        !matches!(self, Self::NotConnected | Self::NoGameRunning)
    }

    /// Returns `true` once the round has a result.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::YouWin | Self::YouLose)
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotConnected => "NotConnected",
            Self::NoGameRunning => "NoGameRunning",
            Self::Preparations => "Preparations",
            Self::WaitingForOpponent => "WaitingForOpponent",
            Self::PreparationsEnded => "PreparationsEnded",
            Self::OwnTurn => "OwnTurn",
            Self::OpponentsTurn => "OpponentsTurn",
            Self::YouWin => "YouWin",
            Self::YouLose => "YouLose",
        };
        f.write_str(name)
    }
}
