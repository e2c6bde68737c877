//! The closed status table for server reports.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Every status code the client acts on.
///
/// The set is closed: a code outside this enum is still a valid wire
/// value, but [`StatusCode::from_code`] returns `None` for it and the
/// receive loop logs and drops the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum StatusCode {
    BeginTurn = 11,
    UpdateOwnField = 13,
    UpdateEnemyField = 14,
    ChatBroadcast = 15,
    UpdateLobby = 16,
    GameEnded = 17,
    BeginShipPlacing = 18,
    GameAborted = 19,
    SuccessfulMove = 21,
    SuccessfulAttack = 22,
    SurrenderAccepted = 23,
    SuccessfulSpecialAttack = 24,
    SuccessfulGameJoin = 27,
    SuccessfulGameCreate = 28,
    SuccessfulShipPlacement = 29,
    IllegalMove = 31,
    IllegalSpecialAttack = 32,
    IllegalGameDefinition = 37,
    IllegalShipPlacement = 38,
    IllegalAttack = 39,
    MessageNotRecognized = 40,
    NotYourTurn = 41,
    NotInAnyGame = 43,
    GameJoinDenied = 47,
    GamePreparationsEnded = 48,
}

impl StatusCode {
    /// All members of the table, in code order.
    pub const ALL: [StatusCode; 25] = [
        Self::BeginTurn,
        Self::UpdateOwnField,
        Self::UpdateEnemyField,
        Self::ChatBroadcast,
        Self::UpdateLobby,
        Self::GameEnded,
        Self::BeginShipPlacing,
        Self::GameAborted,
        Self::SuccessfulMove,
        Self::SuccessfulAttack,
        Self::SurrenderAccepted,
        Self::SuccessfulSpecialAttack,
        Self::SuccessfulGameJoin,
        Self::SuccessfulGameCreate,
        Self::SuccessfulShipPlacement,
        Self::IllegalMove,
        Self::IllegalSpecialAttack,
        Self::IllegalGameDefinition,
        Self::IllegalShipPlacement,
        Self::IllegalAttack,
        Self::MessageNotRecognized,
        Self::NotYourTurn,
        Self::NotInAnyGame,
        Self::GameJoinDenied,
        Self::GamePreparationsEnded,
    ];

    /// Looks a raw code up in the table.
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    /// The numeric wire value.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// The report name used by the server documentation.
    pub fn name(self) -> &'static str {
        match self {
            Self::BeginTurn => "Begin_Turn",
            Self::UpdateOwnField => "Update_Own_Field",
            Self::UpdateEnemyField => "Update_Enemy_Field",
            Self::ChatBroadcast => "Chat_Broadcast",
            Self::UpdateLobby => "Update_Lobby",
            Self::GameEnded => "Game_Ended",
            Self::BeginShipPlacing => "Begin_Ship_Placing",
            Self::GameAborted => "Game_Aborted",
            Self::SuccessfulMove => "Successful_Move",
            Self::SuccessfulAttack => "Successful_Attack",
            Self::SurrenderAccepted => "Surrender_Accepted",
            Self::SuccessfulSpecialAttack => "Successful_Special_Attack",
            Self::SuccessfulGameJoin => "Successful_Game_Join",
            Self::SuccessfulGameCreate => "Successful_Game_Create",
            Self::SuccessfulShipPlacement => "Successful_Ship_Placement",
            Self::IllegalMove => "Illegal_Move",
            Self::IllegalSpecialAttack => "Illegal_Special_Attack",
            Self::IllegalGameDefinition => "Illegal_Game_Definition",
            Self::IllegalShipPlacement => "Illegal_Ship_Placement",
            Self::IllegalAttack => "Illegal_Attack",
            Self::MessageNotRecognized => "Message_Not_Recognized",
            Self::NotYourTurn => "Not_Your_Turn",
            Self::NotInAnyGame => "Not_In_Any_Game",
            Self::GameJoinDenied => "Game_Join_Denied",
            Self::GamePreparationsEnded => "Game_Preparation_Ended",
        }
    }
}

impl TryFrom<u16> for StatusCode {
    type Error = ProtocolError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(ProtocolError::UnknownStatus(code))
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_round_trips_every_member() {
        for status in StatusCode::ALL {
            assert_eq!(StatusCode::from_code(status.code()), Some(status));
        }
    }

    #[test]
    fn test_from_code_outside_table_is_none() {
        // 33 and 34 appear in some server builds but are not acted on.
        for code in [0, 12, 33, 34, 42, 49, 999] {
            assert_eq!(StatusCode::from_code(code), None, "code {code}");
        }
    }

    #[test]
    fn test_try_from_unknown_returns_unknown_status() {
        assert!(matches!(
            StatusCode::try_from(99),
            Err(ProtocolError::UnknownStatus(99))
        ));
    }

    #[test]
    fn test_table_codes_are_strictly_increasing() {
        let codes: Vec<u16> = StatusCode::ALL.iter().map(|s| s.code()).collect();
        assert!(codes.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_display_includes_name_and_code() {
        assert_eq!(StatusCode::GameJoinDenied.to_string(), "Game_Join_Denied (47)");
    }
}
