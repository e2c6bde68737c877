//! Outbound client requests.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Message, ProtocolError};

/// A compass direction, encoded on the wire as a single letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn code(self) -> &'static str {
        match self {
            Self::North => "N",
            Self::South => "S",
            Self::East => "E",
            Self::West => "W",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Direction {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "N" => Ok(Self::North),
            "S" => Ok(Self::South),
            "E" => Ok(Self::East),
            "W" => Ok(Self::West),
            other => Err(ProtocolError::InvalidParam {
                key: "direction".into(),
                value: other.to_string(),
            }),
        }
    }
}

/// A cell on a playing field. The geometry itself belongs to the
/// playing-field collaborator; the protocol only carries the numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: u32,
    pub y: u32,
}

impl Coordinate {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Where one ship sits: its rear cell and the direction it points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipPlacement {
    pub rear: Coordinate,
    pub direction: Direction,
}

/// Everything the client can ask of the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientRequest {
    SetNickname { name: String },
    JoinGame { name: String },
    CreateGame { name: String },
    /// Leave (or abort) the current game.
    AbortGame,
    /// Submit the whole fleet in one message.
    BoardInit { ships: Vec<ShipPlacement> },
    Attack { target: Coordinate },
    SpecialAttack { target: Coordinate },
    Move { ship_id: u32, direction: Direction },
    Chat { text: String },
    Surrender,
}

impl ClientRequest {
    /// The wire type label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SetNickname { .. } => "nickname_set",
            Self::JoinGame { .. } => "game_join",
            Self::CreateGame { .. } => "game_create",
            Self::AbortGame => "game_abort",
            Self::BoardInit { .. } => "board_init",
            Self::Attack { .. } => "attack",
            Self::SpecialAttack { .. } => "special_attack",
            Self::Move { .. } => "move",
            Self::Chat { .. } => "chat_send",
            Self::Surrender => "surrender",
        }
    }

    pub fn to_message(&self) -> Message {
        let msg = Message::new(self.kind());
        match self {
            Self::SetNickname { name }
            | Self::JoinGame { name }
            | Self::CreateGame { name } => msg.with_param("name", name),
            Self::AbortGame | Self::Surrender => msg,
            Self::BoardInit { ships } => {
                ships.iter().enumerate().fold(msg, |msg, (i, ship)| {
                    msg.with_param(format!("ship_{i}_x"), ship.rear.x)
                        .with_param(format!("ship_{i}_y"), ship.rear.y)
                        .with_param(format!("ship_{i}_direction"), ship.direction)
                })
            }
            Self::Attack { target } | Self::SpecialAttack { target } => msg
                .with_param("coordinate_x", target.x)
                .with_param("coordinate_y", target.y),
            Self::Move { ship_id, direction } => msg
                .with_param("ship_id", ship_id)
                .with_param("direction", direction),
            Self::Chat { text } => msg.with_param("text", text),
        }
    }
}

impl From<&ClientRequest> for Message {
    fn from(request: &ClientRequest) -> Self {
        request.to_message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_codes_parse_back() {
        for dir in [Direction::North, Direction::South, Direction::East, Direction::West] {
            assert_eq!(dir.code().parse::<Direction>().unwrap(), dir);
        }
        assert!("X".parse::<Direction>().is_err());
    }

    #[test]
    fn test_board_init_flattens_ships() {
        let request = ClientRequest::BoardInit {
            ships: vec![
                ShipPlacement { rear: Coordinate::new(0, 1), direction: Direction::North },
                ShipPlacement { rear: Coordinate::new(5, 9), direction: Direction::West },
            ],
        };
        let msg = request.to_message();

        assert_eq!(msg.kind, "board_init");
        assert_eq!(msg.params.len(), 6);
        assert_eq!(msg.param("ship_0_y"), Some("1"));
        assert_eq!(msg.param("ship_1_x"), Some("5"));
        assert_eq!(msg.param("ship_1_direction"), Some("W"));
    }

    #[test]
    fn test_attack_and_special_attack_share_coordinates() {
        let target = Coordinate::new(3, 4);
        let attack = ClientRequest::Attack { target }.to_message();
        let special = ClientRequest::SpecialAttack { target }.to_message();

        assert_eq!(attack.kind, "attack");
        assert_eq!(special.kind, "special_attack");
        assert_eq!(attack.params, special.params);
        assert_eq!(attack.param("coordinate_x"), Some("3"));
    }

    #[test]
    fn test_move_uses_letter_direction() {
        let msg = ClientRequest::Move { ship_id: 2, direction: Direction::East }.to_message();
        assert_eq!(msg.param("ship_id"), Some("2"));
        assert_eq!(msg.param("direction"), Some("E"));
    }

    #[test]
    fn test_parameterless_requests() {
        assert!(ClientRequest::Surrender.to_message().params.is_empty());
        assert_eq!(ClientRequest::AbortGame.to_message().kind, "game_abort");
    }

    #[test]
    fn test_name_requests() {
        let msg = ClientRequest::JoinGame { name: "armada".into() }.to_message();
        assert_eq!(msg.kind, "game_join");
        assert_eq!(msg.param("name"), Some("armada"));
        let msg = ClientRequest::SetNickname { name: "Ada".into() }.to_message();
        assert_eq!(msg.kind, "nickname_set");
    }
}
