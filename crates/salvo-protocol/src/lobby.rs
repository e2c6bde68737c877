//! Lobby payloads: players, games, and the snapshot carried by
//! `Update_Lobby` reports.
//!
//! The server sends the whole lobby every time, flattened into indexed
//! parameters:
//!
//! ```text
//! number_of_clients:2; number_of_games:1;
//! player_identifier_0:a1; player_name_0:Ada;
//! player_identifier_1:b7; player_name_1:;
//! game_name_0:armada; game_players_count_0:2;
//! game_player_0_0:a1; game_player_0_1:b7;
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::message::{Params, parse_param, require};
use crate::ProtocolError;

/// Most players a game can hold.
const MAX_GAME_PLAYERS: usize = 2;

/// A server-assigned player identifier.
///
/// Opaque: the server may use any string. The identifier is the stable
/// identity of a player; the nickname is only a display attribute.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A player listed in the lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: PlayerId,
    /// May be empty if the player never set a nickname.
    pub nickname: String,
}

impl PlayerRecord {
    pub fn new(id: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            id: PlayerId::new(id),
            nickname: nickname.into(),
        }
    }
}

impl fmt::Display for PlayerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.id, self.nickname)
    }
}

/// An open or running game.
///
/// `players[0]` is the creator, `players[1]` (if present) the player who
/// joined. Snapshots never hold more than two entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub name: String,
    pub players: Vec<PlayerId>,
}

impl GameRecord {
    /// A freshly created game with only its creator.
    pub fn new(name: impl Into<String>, creator: PlayerId) -> Self {
        Self {
            name: name.into(),
            players: vec![creator],
        }
    }

    /// Builder-style helper that adds the second player.
    pub fn with_opponent(mut self, opponent: PlayerId) -> Self {
        self.players.truncate(1);
        self.players.push(opponent);
        self
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_GAME_PLAYERS
    }
}

impl fmt::Display for GameRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.name)?;
        for (i, player) in self.players.iter().enumerate() {
            let sep = if i == 0 { " " } else { " vs. " };
            write!(f, "{sep}{player}")?;
        }
        Ok(())
    }
}

/// The full lobby as reported by the server. Authoritative, never a diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbySnapshot {
    pub players: Vec<PlayerRecord>,
    pub games: Vec<GameRecord>,
}

impl LobbySnapshot {
    /// Parses the indexed lobby parameters of an `Update_Lobby` report.
    ///
    /// A game that claims more than two players is a protocol violation:
    /// it is logged and only the first two players are kept. A game that
    /// claims zero players is skipped.
    ///
    /// # Errors
    /// Returns [`ProtocolError::MissingParam`] or
    /// [`ProtocolError::InvalidParam`] if a counter or an indexed entry is
    /// absent or malformed.
    pub fn from_params(params: &Params) -> Result<Self, ProtocolError> {
        let player_count: usize = parse_param(params, "number_of_clients")?;
        let game_count: usize = parse_param(params, "number_of_games")?;

        // Counters come from the wire; every entry needs at least one
        // parameter, so the parameter count bounds any honest reservation.
        let mut players = Vec::with_capacity(player_count.min(params.len()));
        for i in 0..player_count {
            let id = require(params, &format!("player_identifier_{i}"))?;
            let nickname = params
                .get(&format!("player_name_{i}"))
                .cloned()
                .unwrap_or_default();
            players.push(PlayerRecord::new(id, nickname));
        }

        let mut games = Vec::with_capacity(game_count.min(params.len()));
        for k in 0..game_count {
            let name = require(params, &format!("game_name_{k}"))?;
            let claimed: usize =
                parse_param(params, &format!("game_players_count_{k}"))?;

            if claimed == 0 {
                tracing::warn!(game = name, "lobby lists a game without players, skipping");
                continue;
            }
            if claimed > MAX_GAME_PLAYERS {
                tracing::error!(
                    game = name,
                    claimed,
                    "lobby lists too many players for one game, keeping the first two"
                );
            }

            let mut ids = Vec::with_capacity(MAX_GAME_PLAYERS);
            for i in 0..claimed.min(MAX_GAME_PLAYERS) {
                let id = require(params, &format!("game_player_{k}_{i}"))?;
                ids.push(PlayerId::new(id));
            }

            games.push(GameRecord {
                name: name.to_string(),
                players: ids,
            });
        }

        Ok(Self { players, games })
    }

    /// Flattens the snapshot into the indexed parameter layout.
    pub fn to_params(&self) -> Params {
        let mut params = Params::new();
        params.insert("number_of_clients".into(), self.players.len().to_string());
        params.insert("number_of_games".into(), self.games.len().to_string());

        for (i, player) in self.players.iter().enumerate() {
            params.insert(format!("player_identifier_{i}"), player.id.to_string());
            params.insert(format!("player_name_{i}"), player.nickname.clone());
        }
        for (k, game) in self.games.iter().enumerate() {
            params.insert(format!("game_name_{k}"), game.name.clone());
            params.insert(format!("game_players_count_{k}"), game.players.len().to_string());
            for (i, id) in game.players.iter().enumerate() {
                params.insert(format!("game_player_{k}_{i}"), id.to_string());
            }
        }
        params
    }

    pub fn player(&self, id: &PlayerId) -> Option<&PlayerRecord> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn game(&self, name: &str) -> Option<&GameRecord> {
        self.games.iter().find(|g| g.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_params_full_lobby() {
        let p = params(&[
            ("number_of_clients", "3"),
            ("number_of_games", "2"),
            ("player_identifier_0", "a1"),
            ("player_name_0", "Ada"),
            ("player_identifier_1", "b7"),
            ("player_name_1", "Bob"),
            ("player_identifier_2", "c3"),
            ("game_name_0", "armada"),
            ("game_players_count_0", "2"),
            ("game_player_0_0", "a1"),
            ("game_player_0_1", "b7"),
            ("game_name_1", "solo"),
            ("game_players_count_1", "1"),
            ("game_player_1_0", "c3"),
        ]);

        let snapshot = LobbySnapshot::from_params(&p).unwrap();

        assert_eq!(snapshot.players.len(), 3);
        // A missing nickname becomes an empty string.
        assert_eq!(snapshot.players[2], PlayerRecord::new("c3", ""));
        assert_eq!(
            snapshot.game("armada").unwrap().players,
            vec![PlayerId::new("a1"), PlayerId::new("b7")]
        );
        assert!(!snapshot.game("solo").unwrap().is_full());
    }

    #[test]
    fn test_from_params_three_players_keeps_first_two() {
        let p = params(&[
            ("number_of_clients", "0"),
            ("number_of_games", "1"),
            ("game_name_0", "crowded"),
            ("game_players_count_0", "3"),
            ("game_player_0_0", "x"),
            ("game_player_0_1", "y"),
            ("game_player_0_2", "z"),
        ]);

        let snapshot = LobbySnapshot::from_params(&p).unwrap();
        assert_eq!(
            snapshot.games[0].players,
            vec![PlayerId::new("x"), PlayerId::new("y")]
        );
    }

    #[test]
    fn test_from_params_ignores_entries_beyond_counters() {
        let p = params(&[
            ("number_of_clients", "1"),
            ("number_of_games", "0"),
            ("player_identifier_0", "a1"),
            ("player_identifier_1", "stale"),
            ("game_name_0", "stale"),
        ]);

        let snapshot = LobbySnapshot::from_params(&p).unwrap();
        assert_eq!(snapshot.players.len(), 1);
        assert!(snapshot.games.is_empty());
    }

    #[test]
    fn test_from_params_missing_counter_fails() {
        let p = params(&[("number_of_games", "0")]);
        assert!(matches!(
            LobbySnapshot::from_params(&p),
            Err(ProtocolError::MissingParam(k)) if k == "number_of_clients"
        ));
    }

    #[test]
    fn test_from_params_missing_game_player_fails() {
        let p = params(&[
            ("number_of_clients", "0"),
            ("number_of_games", "1"),
            ("game_name_0", "armada"),
            ("game_players_count_0", "2"),
            ("game_player_0_0", "a1"),
        ]);
        assert!(matches!(
            LobbySnapshot::from_params(&p),
            Err(ProtocolError::MissingParam(k)) if k == "game_player_0_1"
        ));
    }

    #[test]
    fn test_from_params_huge_client_count_fails_without_allocating() {
        let p = params(&[
            ("number_of_clients", "18446744073709551615"),
            ("number_of_games", "0"),
        ]);
        assert!(matches!(
            LobbySnapshot::from_params(&p),
            Err(ProtocolError::MissingParam(k)) if k == "player_identifier_0"
        ));
    }

    #[test]
    fn test_from_params_huge_game_count_fails_without_allocating() {
        let p = params(&[
            ("number_of_clients", "0"),
            ("number_of_games", "18446744073709551615"),
            ("game_name_0", "armada"),
            ("game_players_count_0", "1"),
            ("game_player_0_0", "a1"),
        ]);
        assert!(matches!(
            LobbySnapshot::from_params(&p),
            Err(ProtocolError::MissingParam(k)) if k == "game_name_1"
        ));
    }

    #[test]
    fn test_from_params_counter_beyond_entries_fails() {
        let p = params(&[
            ("number_of_clients", "3"),
            ("number_of_games", "0"),
            ("player_identifier_0", "a1"),
            ("player_identifier_1", "b7"),
        ]);
        assert!(matches!(
            LobbySnapshot::from_params(&p),
            Err(ProtocolError::MissingParam(k)) if k == "player_identifier_2"
        ));
    }

    #[test]
    fn test_from_params_non_numeric_counter_fails() {
        let p = params(&[("number_of_clients", "lots"), ("number_of_games", "0")]);
        assert!(matches!(
            LobbySnapshot::from_params(&p),
            Err(ProtocolError::InvalidParam { key, .. }) if key == "number_of_clients"
        ));
    }

    #[test]
    fn test_from_params_negative_game_player_count_fails() {
        let p = params(&[
            ("number_of_clients", "0"),
            ("number_of_games", "1"),
            ("game_name_0", "armada"),
            ("game_players_count_0", "-1"),
        ]);
        assert!(matches!(
            LobbySnapshot::from_params(&p),
            Err(ProtocolError::InvalidParam { key, .. }) if key == "game_players_count_0"
        ));
    }

    #[test]
    fn test_to_params_parses_back() {
        let snapshot = LobbySnapshot {
            players: vec![PlayerRecord::new("a1", "Ada"), PlayerRecord::new("b7", "")],
            games: vec![
                GameRecord::new("armada", PlayerId::new("a1"))
                    .with_opponent(PlayerId::new("b7")),
            ],
        };
        assert_eq!(LobbySnapshot::from_params(&snapshot.to_params()).unwrap(), snapshot);
    }

    #[test]
    fn test_game_record_display() {
        let game = GameRecord::new("armada", PlayerId::new("a1"));
        assert_eq!(game.to_string(), "armada: a1");
        let game = game.with_opponent(PlayerId::new("b7"));
        assert_eq!(game.to_string(), "armada: a1 vs. b7");
    }
}
