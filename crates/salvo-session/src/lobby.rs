//! The client's view of the lobby and of its own game.
//!
//! The server sends the whole lobby on every change. [`Lobby::apply_snapshot`]
//! replaces the local lists and then reconciles the own game against the
//! fresh record: that is where a newly arrived opponent (or an opponent
//! who changed nickname) is noticed.

use salvo_protocol::{GameRecord, LobbySnapshot, PlayerId, PlayerRecord, WinnerSlot};

/// How the client got into its current game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameRole {
    Creator,
    Joiner,
}

impl GameRole {
    /// The index of the opponent in the game's player list. The creator
    /// is always listed first.
    pub fn opponent_slot(self) -> usize {
        match self {
            Self::Creator => 1,
            Self::Joiner => 0,
        }
    }

    pub fn has_won(self, winner: WinnerSlot) -> bool {
        matches!(
            (self, winner),
            (Self::Creator, WinnerSlot::Creator) | (Self::Joiner, WinnerSlot::Joiner)
        )
    }
}

/// The game this client is part of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnGame {
    pub name: String,
    pub role: GameRole,
    /// The opponent as last seen in a lobby snapshot.
    pub opponent: Option<PlayerRecord>,
}

/// What a snapshot changed about the own game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LobbyChange {
    pub opponent_joined: Option<PlayerRecord>,
    pub opponent_renamed: Option<PlayerRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct Lobby {
    players: Vec<PlayerRecord>,
    games: Vec<GameRecord>,
    own_game: Option<OwnGame>,
    nickname: String,
    /// The game named by the last join or create request.
    tried_game: Option<String>,
}

impl Lobby {
    pub fn new(nickname: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            ..Self::default()
        }
    }

    /// Forgets players, games and the own game. The nickname survives.
    pub fn reset(&mut self) {
        self.players.clear();
        self.games.clear();
        self.own_game = None;
        self.tried_game = None;
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn set_nickname(&mut self, nickname: impl Into<String>) {
        self.nickname = nickname.into();
    }

    pub fn players(&self) -> &[PlayerRecord] {
        &self.players
    }

    pub fn games(&self) -> &[GameRecord] {
        &self.games
    }

    pub fn snapshot(&self) -> LobbySnapshot {
        LobbySnapshot {
            players: self.players.clone(),
            games: self.games.clone(),
        }
    }

    pub fn own_game(&self) -> Option<&OwnGame> {
        self.own_game.as_ref()
    }

    pub fn created_own_game(&self) -> bool {
        self.role() == Some(GameRole::Creator)
    }

    pub fn joined_own_game(&self) -> bool {
        self.role() == Some(GameRole::Joiner)
    }

    pub fn role(&self) -> Option<GameRole> {
        self.own_game.as_ref().map(|game| game.role)
    }

    /// Remembers the game a join or create request names.
    pub fn try_game(&mut self, name: impl Into<String>) {
        self.tried_game = Some(name.into());
    }

    pub fn tried_game(&self) -> Option<&str> {
        self.tried_game.as_deref()
    }

    pub fn forget_tried_game(&mut self) -> Option<String> {
        self.tried_game.take()
    }

    /// Turns the tried game into the own game as its joiner. The creator,
    /// if the lobby already lists the game, becomes the opponent.
    pub fn join_successful(&mut self) -> Option<&OwnGame> {
        let name = self.tried_game.take()?;
        let opponent = self
            .games
            .iter()
            .find(|game| game.name == name)
            .and_then(|game| game.players.get(GameRole::Joiner.opponent_slot()))
            .map(|id| self.record_for(id));

        self.own_game = Some(OwnGame {
            name,
            role: GameRole::Joiner,
            opponent,
        });
        self.own_game.as_ref()
    }

    /// Turns the tried game into the own game as its creator.
    pub fn create_successful(&mut self) -> Option<&OwnGame> {
        let name = self.tried_game.take()?;
        self.own_game = Some(OwnGame {
            name,
            role: GameRole::Creator,
            opponent: None,
        });
        self.own_game.as_ref()
    }

    pub fn leave_game(&mut self) -> Option<OwnGame> {
        self.tried_game = None;
        self.own_game.take()
    }

    /// Replaces the local lists with `snapshot` and reconciles the own game.
    ///
    /// - Opponent unknown and the refreshed record lists a player in the
    ///   opponent slot: that player becomes the opponent and is reported
    ///   once as joined.
    /// - Opponent known and listed with a different nickname: the stored
    ///   record is updated and reported as renamed.
    ///
    /// Applying the same snapshot twice reports nothing the second time.
    pub fn apply_snapshot(&mut self, snapshot: LobbySnapshot) -> LobbyChange {
        self.players = snapshot.players;
        self.games = snapshot.games;

        let mut change = LobbyChange::default();
        let Some(own) = self.own_game.as_mut() else {
            return change;
        };
        let Some(game) = self.games.iter().find(|game| game.name == own.name) else {
            tracing::debug!(game = %own.name, "own game missing from lobby snapshot");
            return change;
        };

        match own.opponent.as_mut() {
            Some(known) => {
                let listed = self.players.iter().find(|player| player.id == known.id);
                if let Some(current) = listed {
                    if current.nickname != known.nickname {
                        tracing::info!(
                            id = %known.id,
                            old = %known.nickname,
                            new = %current.nickname,
                            "opponent changed nickname"
                        );
                        known.nickname = current.nickname.clone();
                        change.opponent_renamed = Some(known.clone());
                    }
                }
            }
            None => {
                if let Some(id) = game.players.get(own.role.opponent_slot()) {
                    let record = find_record(&self.players, id);
                    tracing::info!(game = %own.name, opponent = %record, "opponent joined");
                    own.opponent = Some(record.clone());
                    change.opponent_joined = Some(record);
                }
            }
        }

        change
    }

    fn record_for(&self, id: &PlayerId) -> PlayerRecord {
        find_record(&self.players, id)
    }
}

/// Looks a player up by id. Ids the lobby does not list get an empty
/// nickname.
fn find_record(players: &[PlayerRecord], id: &PlayerId) -> PlayerRecord {
    players
        .iter()
        .find(|player| &player.id == id)
        .cloned()
        .unwrap_or_else(|| PlayerRecord {
            id: id.clone(),
            nickname: String::new(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(players: &[(&str, &str)], games: &[(&str, &[&str])]) -> LobbySnapshot {
        LobbySnapshot {
            players: players
                .iter()
                .map(|(id, nick)| PlayerRecord::new(*id, *nick))
                .collect(),
            games: games
                .iter()
                .map(|(name, ids)| GameRecord {
                    name: name.to_string(),
                    players: ids.iter().map(|id| PlayerId::new(*id)).collect(),
                })
                .collect(),
        }
    }

    fn created(name: &str) -> Lobby {
        let mut lobby = Lobby::new("Ada");
        lobby.try_game(name);
        lobby.create_successful();
        lobby
    }

    // =========================================================================
    // Own game bookkeeping
    // =========================================================================

    #[test]
    fn test_create_successful_without_try_is_none() {
        let mut lobby = Lobby::new("Ada");
        assert!(lobby.create_successful().is_none());
        assert!(lobby.own_game().is_none());
    }

    #[test]
    fn test_create_successful_sets_creator_role() {
        let lobby = created("armada");
        assert!(lobby.created_own_game());
        assert!(!lobby.joined_own_game());
        assert_eq!(lobby.own_game().unwrap().name, "armada");
        assert!(lobby.tried_game().is_none());
    }

    #[test]
    fn test_join_successful_takes_creator_as_opponent() {
        let mut lobby = Lobby::new("Bob");
        lobby.apply_snapshot(snapshot(&[("1", "Ada"), ("2", "Bob")], &[("armada", &["1"])]));
        lobby.try_game("armada");

        let own = lobby.join_successful().unwrap();
        assert_eq!(own.role, GameRole::Joiner);
        assert_eq!(own.opponent, Some(PlayerRecord::new("1", "Ada")));
        assert!(lobby.joined_own_game());
    }

    #[test]
    fn test_reset_keeps_nickname() {
        let mut lobby = created("armada");
        lobby.apply_snapshot(snapshot(&[("1", "Ada")], &[("armada", &["1"])]));
        lobby.reset();

        assert_eq!(lobby.nickname(), "Ada");
        assert!(lobby.players().is_empty());
        assert!(lobby.games().is_empty());
        assert!(lobby.own_game().is_none());
    }

    #[test]
    fn test_game_role_has_won() {
        assert!(GameRole::Creator.has_won(WinnerSlot::Creator));
        assert!(!GameRole::Creator.has_won(WinnerSlot::Joiner));
        assert!(GameRole::Joiner.has_won(WinnerSlot::Joiner));
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    #[test]
    fn test_apply_snapshot_replaces_lists() {
        let mut lobby = Lobby::new("Ada");
        lobby.apply_snapshot(snapshot(&[("1", "Ada"), ("2", "Bob")], &[("a", &["1"])]));
        lobby.apply_snapshot(snapshot(&[("3", "Cy")], &[]));

        assert_eq!(lobby.players(), &[PlayerRecord::new("3", "Cy")]);
        assert!(lobby.games().is_empty());
    }

    #[test]
    fn test_apply_snapshot_second_player_joins_once() {
        let mut lobby = created("armada");
        let before = snapshot(&[("1", "Ada")], &[("armada", &["1"])]);
        let after = snapshot(&[("1", "Ada"), ("2", "Bob")], &[("armada", &["1", "2"])]);

        assert_eq!(lobby.apply_snapshot(before), LobbyChange::default());

        let change = lobby.apply_snapshot(after.clone());
        assert_eq!(change.opponent_joined, Some(PlayerRecord::new("2", "Bob")));
        assert_eq!(change.opponent_renamed, None);

        assert_eq!(lobby.apply_snapshot(after), LobbyChange::default());
    }

    #[test]
    fn test_apply_snapshot_unrelated_game_is_ignored() {
        let mut lobby = created("armada");
        let change = lobby.apply_snapshot(snapshot(
            &[("1", "Ada"), ("2", "Bob"), ("3", "Cy")],
            &[("armada", &["1"]), ("flotilla", &["2", "3"])],
        ));
        assert_eq!(change, LobbyChange::default());
        assert!(lobby.own_game().unwrap().opponent.is_none());
    }

    #[test]
    fn test_apply_snapshot_opponent_rename_detected() {
        let mut lobby = created("armada");
        lobby.apply_snapshot(snapshot(&[("1", "Ada"), ("2", "Bob")], &[("armada", &["1", "2"])]));

        let change = lobby.apply_snapshot(snapshot(
            &[("1", "Ada"), ("2", "Robert")],
            &[("armada", &["1", "2"])],
        ));
        assert_eq!(change.opponent_joined, None);
        assert_eq!(change.opponent_renamed, Some(PlayerRecord::new("2", "Robert")));
        assert_eq!(
            lobby.own_game().unwrap().opponent.as_ref().unwrap().nickname,
            "Robert"
        );
    }

    #[test]
    fn test_apply_snapshot_joiner_learns_creator_late() {
        let mut lobby = Lobby::new("Bob");
        lobby.try_game("armada");
        lobby.join_successful();
        assert!(lobby.own_game().unwrap().opponent.is_none());

        let change = lobby.apply_snapshot(snapshot(
            &[("1", "Ada"), ("2", "Bob")],
            &[("armada", &["1", "2"])],
        ));
        assert_eq!(change.opponent_joined, Some(PlayerRecord::new("1", "Ada")));
    }

    #[test]
    fn test_apply_snapshot_unlisted_opponent_gets_empty_nickname() {
        let mut lobby = created("armada");
        let change = lobby.apply_snapshot(snapshot(&[("1", "Ada")], &[("armada", &["1", "9"])]));
        assert_eq!(change.opponent_joined, Some(PlayerRecord::new("9", "")));
    }
}
