//! The client session: state machine, lobby view and pending requests.
//!
//! A [`ClientSession`] is plain data. It never touches a socket: user
//! operations return the [`ClientRequest`] the caller should send, and
//! server reports come in through [`ClientSession::handle_report`]. The
//! owner (the client actor in the `salvo` crate) serializes both paths,
//! so state and lobby are only ever mutated from one task.

use std::time::Instant;

use salvo_protocol::{
    ChatMessage, ClientRequest, Coordinate, Direction, FieldSide, LobbySnapshot, Params, Report,
    ShipPlacement, StatusCode, WinnerSlot,
};

use crate::dispatcher::{RejectedAction, ReportHandler, dispatch};
use crate::{
    ClientState, FieldEvent, Lobby, Notifier, PendingRequest, RequestKind, RequestOutcome,
    SessionConfig, SessionError,
};

pub struct ClientSession {
    config: SessionConfig,
    state: ClientState,
    lobby: Lobby,
    notifier: Notifier,
    /// A join or create request.
    pending_lobby: Option<PendingRequest>,
    /// A placement, turn action or surrender.
    pending_action: Option<PendingRequest>,
    /// Whether the board was sent in the current placement round.
    board_sent: bool,
    /// The last move sent, replayed once the server accepts it.
    last_move: Option<(u32, Direction)>,
}

impl ClientSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: ClientState::NotConnected,
            lobby: Lobby::default(),
            notifier: Notifier::new(),
            pending_lobby: None,
            pending_action: None,
            board_sent: false,
            last_move: None,
        }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn lobby(&self) -> &Lobby {
        &self.lobby
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn notifier_mut(&mut self) -> &mut Notifier {
        &mut self.notifier
    }

    pub fn pending_lobby(&self) -> Option<&PendingRequest> {
        self.pending_lobby.as_ref()
    }

    pub fn pending_action(&self) -> Option<&PendingRequest> {
        self.pending_action.as_ref()
    }

    pub fn board_sent(&self) -> bool {
        self.board_sent
    }

    // -----------------------------------------------------------------------
    // Connection lifecycle
    // -----------------------------------------------------------------------

    /// Records a successful connect. Returns the nickname request to send
    /// first, if a nickname is set.
    pub fn connected(&mut self) -> Option<ClientRequest> {
        self.clear_round();
        self.lobby.reset();
        self.set_state(ClientState::NoGameRunning);

        let name = self.lobby.nickname();
        (!name.is_empty()).then(|| ClientRequest::SetNickname {
            name: name.to_string(),
        })
    }

    /// Forgets the lobby and every pending request and goes back to
    /// `NotConnected`. Used for disconnect and reset alike.
    pub fn reset(&mut self) {
        self.fail_pending_lobby();
        if let Some(pending) = self.pending_action.take() {
            self.notifier.outcome(RequestOutcome::new(pending.kind, false));
        }
        self.clear_round();
        self.lobby.reset();
        self.set_state(ClientState::NotConnected);
    }

    /// The receive loop or a send reported the connection as gone.
    pub fn connection_lost(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::error!(%reason, state = %self.state, "connection lost");
        self.notifier.error(SessionError::ConnectionLost(reason));
        self.reset();
    }

    /// Stores the nickname. Returns the request to send if connected.
    pub fn set_nickname(&mut self, name: impl Into<String>) -> Option<ClientRequest> {
        let name = name.into();
        self.lobby.set_nickname(name.clone());
        self.state
            .is_connected()
            .then_some(ClientRequest::SetNickname { name })
    }

    // -----------------------------------------------------------------------
    // Lobby operations
    // -----------------------------------------------------------------------

    pub fn join_game(&mut self, name: impl Into<String>) -> Result<ClientRequest, SessionError> {
        let name = name.into();
        self.begin_lobby_request(RequestKind::Join, &name)?;
        Ok(ClientRequest::JoinGame { name })
    }

    pub fn create_game(&mut self, name: impl Into<String>) -> Result<ClientRequest, SessionError> {
        let name = name.into();
        self.begin_lobby_request(RequestKind::Create, &name)?;
        Ok(ClientRequest::CreateGame { name })
    }

    /// Leaves (or aborts) the current game. A pending join or create is
    /// resolved as failed.
    pub fn leave_game(&mut self) -> Result<ClientRequest, SessionError> {
        if !self.state.is_connected() {
            return self.reject(SessionError::NotConnected);
        }

        self.fail_pending_lobby();
        if let Some(pending) = self.pending_action.take() {
            self.notifier.outcome(RequestOutcome::new(pending.kind, false));
        }
        if let Some(game) = self.lobby.leave_game() {
            tracing::info!(game = %game.name, "leaving game");
        }
        self.clear_round();
        self.set_state(ClientState::NoGameRunning);
        Ok(ClientRequest::AbortGame)
    }

    pub fn send_chat(&mut self, text: impl Into<String>) -> Result<ClientRequest, SessionError> {
        if !self.state.is_connected() {
            return self.reject(SessionError::NotConnected);
        }
        Ok(ClientRequest::Chat { text: text.into() })
    }

    // -----------------------------------------------------------------------
    // Game operations
    // -----------------------------------------------------------------------

    /// Sends the whole fleet. Allowed once per placement round.
    pub fn submit_board(&mut self, ships: Vec<ShipPlacement>) -> Result<ClientRequest, SessionError> {
        if self.board_sent {
            return self.reject(SessionError::BoardAlreadySent);
        }
        if self.state != ClientState::Preparations {
            return self.reject(SessionError::NotPlacing);
        }

        self.pending_action = Some(self.pending(RequestKind::Placement));
        self.board_sent = true;
        self.set_state(ClientState::WaitingForOpponent);
        Ok(ClientRequest::BoardInit { ships })
    }

    pub fn attack(&mut self, target: Coordinate) -> Result<ClientRequest, SessionError> {
        self.begin_turn_action(RequestKind::Attack)?;
        Ok(ClientRequest::Attack { target })
    }

    pub fn special_attack(&mut self, target: Coordinate) -> Result<ClientRequest, SessionError> {
        self.begin_turn_action(RequestKind::SpecialAttack)?;
        Ok(ClientRequest::SpecialAttack { target })
    }

    pub fn move_ship(
        &mut self,
        ship_id: u32,
        direction: Direction,
    ) -> Result<ClientRequest, SessionError> {
        self.begin_turn_action(RequestKind::Move)?;
        self.last_move = Some((ship_id, direction));
        Ok(ClientRequest::Move { ship_id, direction })
    }

    pub fn surrender(&mut self) -> Result<ClientRequest, SessionError> {
        if !self.state.in_game() || self.state.is_finished() {
            return self.reject(SessionError::NotInAnyGame);
        }
        if let Some(pending) = &self.pending_action {
            let kind = pending.kind;
            return self.reject(SessionError::RequestPending(kind));
        }

        self.pending_action = Some(self.pending(RequestKind::Surrender));
        Ok(ClientRequest::Surrender)
    }

    // -----------------------------------------------------------------------
    // Inbound
    // -----------------------------------------------------------------------

    /// Routes one report through the dispatcher. A malformed payload is
    /// logged and dropped.
    pub fn handle_report(&mut self, report: Report) {
        let status = report.status;
        if let Err(e) = dispatch(self, report) {
            tracing::warn!(%status, error = %e, "dropping report with malformed payload");
        }
    }

    /// Resolves every pending request whose deadline has passed as failed.
    pub fn expire_pending(&mut self, now: Instant) {
        if self.pending_lobby.as_ref().is_some_and(|p| p.is_expired(now)) {
            let game = self.lobby.forget_tried_game().unwrap_or_default();
            if let Some(pending) = self.pending_lobby.take() {
                tracing::warn!(kind = %pending.kind, %game, "lobby request timed out");
                self.notifier
                    .outcome(RequestOutcome::new(pending.kind, false).for_game(game));
                self.notifier.error(SessionError::TimedOut(pending.kind));
            }
        }

        if self.pending_action.as_ref().is_some_and(|p| p.is_expired(now)) {
            if let Some(pending) = self.pending_action.take() {
                tracing::warn!(kind = %pending.kind, "request timed out");
                if pending.kind == RequestKind::Placement {
                    self.reopen_placement();
                }
                if pending.kind == RequestKind::Move {
                    self.last_move = None;
                }
                self.notifier.outcome(RequestOutcome::new(pending.kind, false));
                self.notifier.error(SessionError::TimedOut(pending.kind));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn set_state(&mut self, next: ClientState) {
        if self.state == next {
            return;
        }
        tracing::info!(from = %self.state, to = %next, "client state changed");
        self.state = next;
        self.notifier.state(next);
    }

    /// Publishes a guard failure once and returns it.
    fn reject<T>(&mut self, error: SessionError) -> Result<T, SessionError> {
        tracing::debug!(%error, state = %self.state, "operation rejected locally");
        self.notifier.error(error.clone());
        Err(error)
    }

    fn pending(&self, kind: RequestKind) -> PendingRequest {
        PendingRequest {
            kind,
            deadline: Instant::now() + self.config.request_timeout,
        }
    }

    fn begin_lobby_request(&mut self, kind: RequestKind, name: &str) -> Result<(), SessionError> {
        if !self.state.is_connected() {
            return self.reject(SessionError::NotConnected);
        }
        if self.state != ClientState::NoGameRunning {
            return self.reject(SessionError::AlreadyInGame);
        }
        if let Some(pending) = &self.pending_lobby {
            let kind = pending.kind;
            return self.reject(SessionError::RequestPending(kind));
        }

        self.lobby.try_game(name);
        self.pending_lobby = Some(self.pending(kind));
        tracing::debug!(%kind, game = name, "lobby request issued");
        Ok(())
    }

    /// The turn guard shared by attack, special attack and move.
    fn begin_turn_action(&mut self, kind: RequestKind) -> Result<(), SessionError> {
        if !self.state.is_connected() {
            return self.reject(SessionError::NotConnected);
        }
        if self.state != ClientState::OwnTurn {
            return self.reject(SessionError::NotYourTurn);
        }
        if let Some(pending) = &self.pending_action {
            let kind = pending.kind;
            return self.reject(SessionError::RequestPending(kind));
        }

        self.pending_action = Some(self.pending(kind));
        Ok(())
    }

    /// Resolves the pending lobby request if it is of `kind`. Returns the
    /// game it named.
    fn finish_lobby(&mut self, kind: RequestKind, success: bool) -> Option<String> {
        if self.pending_lobby.as_ref().map(|p| p.kind) != Some(kind) {
            return None;
        }
        self.pending_lobby = None;

        let game = self.lobby.tried_game().unwrap_or_default().to_string();
        self.notifier
            .outcome(RequestOutcome::new(kind, success).for_game(game.clone()));
        Some(game)
    }

    fn fail_pending_lobby(&mut self) {
        if let Some(pending) = self.pending_lobby.take() {
            let game = self.lobby.forget_tried_game().unwrap_or_default();
            self.notifier
                .outcome(RequestOutcome::new(pending.kind, false).for_game(game));
        }
    }

    /// Resolves the pending action if it is of `kind`.
    fn finish_action(&mut self, kind: RequestKind, success: bool) -> bool {
        if self.pending_action.as_ref().map(|p| p.kind) != Some(kind) {
            return false;
        }
        self.pending_action = None;
        self.notifier.outcome(RequestOutcome::new(kind, success));
        true
    }

    /// The game only moves on once the server holds our board, so a
    /// placement still waiting for its acknowledgement has succeeded.
    fn confirm_placement(&mut self) {
        if self.finish_action(RequestKind::Placement, true) {
            tracing::debug!("placement confirmed by game progress");
        }
    }

    fn enter_game(&mut self) {
        let next = if self.board_sent {
            ClientState::WaitingForOpponent
        } else {
            ClientState::Preparations
        };
        self.set_state(next);
    }

    fn reopen_placement(&mut self) {
        self.board_sent = false;
        if self.state == ClientState::WaitingForOpponent {
            self.set_state(ClientState::Preparations);
        }
    }

    /// Moves to `OpponentsTurn` unless the round already has a result.
    fn pass_turn(&mut self) {
        if !self.state.is_finished() {
            self.set_state(ClientState::OpponentsTurn);
        }
    }

    fn clear_round(&mut self) {
        self.pending_action = None;
        self.board_sent = false;
        self.last_move = None;
    }
}

impl Default for ClientSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSession")
            .field("state", &self.state)
            .field("own_game", &self.lobby.own_game())
            .field("pending_lobby", &self.pending_lobby)
            .field("pending_action", &self.pending_action)
            .field("board_sent", &self.board_sent)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Report handling
// ---------------------------------------------------------------------------

impl ReportHandler for ClientSession {
    fn on_begin_turn(&mut self) {
        self.confirm_placement();
        self.set_state(ClientState::OwnTurn);
    }

    fn on_field_update(&mut self, side: FieldSide, params: Params) {
        self.notifier.field(FieldEvent::Updated { side, params });
    }

    fn on_chat(&mut self, message: ChatMessage) {
        tracing::debug!(author = %message.author, "chat message received");
        self.notifier.chat(message);
    }

    fn on_lobby_update(&mut self, snapshot: LobbySnapshot) {
        let change = self.lobby.apply_snapshot(snapshot.clone());
        self.notifier.lobby(snapshot);

        if let Some(opponent) = change.opponent_joined {
            self.notifier.opponent_joined(opponent);
        }
        if let Some(opponent) = change.opponent_renamed {
            self.notifier.opponent_renamed(opponent);
        }
    }

    fn on_game_ended(&mut self, winner: WinnerSlot) {
        let Some(role) = self.lobby.role() else {
            tracing::warn!(?winner, "game ended without an own game");
            return;
        };
        let result = if role.has_won(winner) {
            ClientState::YouWin
        } else {
            ClientState::YouLose
        };
        self.set_state(result);
    }

    fn on_begin_ship_placing(&mut self) {
        self.board_sent = false;
        self.set_state(ClientState::Preparations);
    }

    fn on_game_aborted(&mut self) {
        if let Some(pending) = self.pending_action.take() {
            self.notifier.outcome(RequestOutcome::new(pending.kind, false));
        }
        if let Some(game) = self.lobby.leave_game() {
            tracing::info!(game = %game.name, "game aborted");
        }
        self.clear_round();
        self.set_state(ClientState::NoGameRunning);
    }

    fn on_move_accepted(&mut self) {
        if self.finish_action(RequestKind::Move, true) {
            if let Some((ship_id, direction)) = self.last_move.take() {
                self.notifier.field(FieldEvent::ShipMoved { ship_id, direction });
            }
        }
        self.pass_turn();
    }

    fn on_attack_accepted(&mut self) {
        self.finish_action(RequestKind::Attack, true);
        self.pass_turn();
    }

    fn on_special_attack_accepted(&mut self) {
        if self.finish_action(RequestKind::SpecialAttack, true) {
            self.notifier.field(FieldEvent::SpecialAttackConfirmed);
        }
        self.pass_turn();
    }

    fn on_surrender_accepted(&mut self) {
        self.finish_action(RequestKind::Surrender, true);
        self.set_state(ClientState::YouLose);
    }

    fn on_join_result(&mut self, success: bool) {
        let Some(game) = self.finish_lobby(RequestKind::Join, success) else {
            tracing::warn!(success, "join result without a pending join");
            return;
        };

        if success {
            tracing::info!(%game, "joined game");
            let opponent = self
                .lobby
                .join_successful()
                .and_then(|own| own.opponent.clone());
            if let Some(opponent) = opponent {
                self.notifier.opponent_joined(opponent);
            }
            self.enter_game();
        } else {
            self.lobby.forget_tried_game();
            self.notifier.error(SessionError::JoinDenied { game });
        }
    }

    fn on_create_result(&mut self, success: bool) {
        let Some(game) = self.finish_lobby(RequestKind::Create, success) else {
            tracing::warn!(success, "create result without a pending create");
            return;
        };

        if success {
            tracing::info!(%game, "created game");
            self.lobby.create_successful();
            self.enter_game();
        } else {
            self.lobby.forget_tried_game();
            self.notifier.error(SessionError::IllegalGameDefinition { game });
        }
    }

    fn on_placement_result(&mut self, success: bool) {
        if !self.finish_action(RequestKind::Placement, success) {
            tracing::debug!(success, "placement result without a pending placement");
        }
        if !success {
            self.notifier.error(SessionError::IllegalPlacement);
            self.reopen_placement();
        }
    }

    fn on_action_rejected(&mut self, action: RejectedAction) {
        let (kind, error) = match action {
            RejectedAction::Move => (Some(RequestKind::Move), SessionError::IllegalMove),
            RejectedAction::SpecialAttack => {
                (Some(RequestKind::SpecialAttack), SessionError::IllegalSpecialAttack)
            }
            RejectedAction::Attack => (Some(RequestKind::Attack), SessionError::IllegalAttack),
            RejectedAction::OutOfTurn => (None, SessionError::NotYourTurn),
        };

        let pending = self.pending_action.as_ref().map(|p| p.kind);
        if let Some(pending) = pending {
            if kind.is_none_or(|kind| kind == pending) {
                self.finish_action(pending, false);
                if pending == RequestKind::Move {
                    self.last_move = None;
                }
            }
        }
        self.notifier.error(error);
    }

    fn on_illegal_game_definition(&mut self) {
        let kind = match self.pending_lobby.as_ref().map(|p| p.kind) {
            Some(RequestKind::Create) => RequestKind::Create,
            Some(RequestKind::Join) => RequestKind::Join,
            _ => {
                tracing::warn!("illegal game definition without a pending join or create");
                return;
            }
        };
        if let Some(game) = self.finish_lobby(kind, false) {
            self.lobby.forget_tried_game();
            self.notifier.error(SessionError::IllegalGameDefinition { game });
        }
    }

    fn on_server_error(&mut self, status: StatusCode) {
        let error = match status {
            StatusCode::NotInAnyGame => {
                if let Some(pending) = self.pending_action.as_ref().map(|p| p.kind) {
                    self.finish_action(pending, false);
                }
                SessionError::NotInAnyGame
            }
            _ => SessionError::MessageNotRecognized,
        };
        tracing::warn!(%status, "server reported an error");
        self.notifier.error(error);
    }

    fn on_preparations_ended(&mut self) {
        self.confirm_placement();
        self.set_state(ClientState::PreparationsEnded);
    }
}
