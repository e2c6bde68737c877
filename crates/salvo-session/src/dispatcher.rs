//! Routing reports to session handlers.
//!
//! [`dispatch`] maps every status of the closed table to exactly one
//! [`ReportHandler`] method. It parses the typed payload where a status
//! carries one and mutates nothing itself. Codes sharing a handler are
//! told apart by a `success` flag (join accepted/denied, placement
//! accepted/rejected).

use salvo_protocol::{
    ChatMessage, FieldSide, LobbySnapshot, Params, ProtocolError, Report, StatusCode, WinnerSlot,
};

/// An in-game action the server refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectedAction {
    Move,
    SpecialAttack,
    Attack,
    /// Any action sent while it was not the client's turn.
    OutOfTurn,
}

/// The session side of the dispatcher.
pub trait ReportHandler {
    /// 11
    fn on_begin_turn(&mut self);
    /// 13 and 14
    fn on_field_update(&mut self, side: FieldSide, params: Params);
    /// 15
    fn on_chat(&mut self, message: ChatMessage);
    /// 16
    fn on_lobby_update(&mut self, snapshot: LobbySnapshot);
    /// 17
    fn on_game_ended(&mut self, winner: WinnerSlot);
    /// 18
    fn on_begin_ship_placing(&mut self);
    /// 19
    fn on_game_aborted(&mut self);
    /// 21
    fn on_move_accepted(&mut self);
    /// 22
    fn on_attack_accepted(&mut self);
    /// 24
    fn on_special_attack_accepted(&mut self);
    /// 23
    fn on_surrender_accepted(&mut self);
    /// 27 and 47
    fn on_join_result(&mut self, success: bool);
    /// 28
    fn on_create_result(&mut self, success: bool);
    /// 29 and 38
    fn on_placement_result(&mut self, success: bool);
    /// 31, 32, 39 and 41
    fn on_action_rejected(&mut self, action: RejectedAction);
    /// 37
    fn on_illegal_game_definition(&mut self);
    /// 40 and 43
    fn on_server_error(&mut self, status: StatusCode);
    /// 48
    fn on_preparations_ended(&mut self);
}

/// Calls the one handler method that `report.status` maps to.
///
/// # Errors
/// Returns the parse error if a lobby, chat or game-ended report carries
/// a malformed payload. No handler is called in that case.
pub fn dispatch<H: ReportHandler + ?Sized>(
    handler: &mut H,
    report: Report,
) -> Result<(), ProtocolError> {
    use StatusCode::*;

    tracing::trace!(status = %report.status, "dispatching report");
    match report.status {
        BeginTurn => handler.on_begin_turn(),
        UpdateOwnField => handler.on_field_update(FieldSide::Own, report.params),
        UpdateEnemyField => handler.on_field_update(FieldSide::Enemy, report.params),
        ChatBroadcast => handler.on_chat(ChatMessage::from_params(&report.params)?),
        UpdateLobby => handler.on_lobby_update(LobbySnapshot::from_params(&report.params)?),
        GameEnded => handler.on_game_ended(WinnerSlot::from_params(&report.params)?),
        BeginShipPlacing => handler.on_begin_ship_placing(),
        GameAborted => handler.on_game_aborted(),
        SuccessfulMove => handler.on_move_accepted(),
        SuccessfulAttack => handler.on_attack_accepted(),
        SurrenderAccepted => handler.on_surrender_accepted(),
        SuccessfulSpecialAttack => handler.on_special_attack_accepted(),
        SuccessfulGameJoin => handler.on_join_result(true),
        GameJoinDenied => handler.on_join_result(false),
        SuccessfulGameCreate => handler.on_create_result(true),
        SuccessfulShipPlacement => handler.on_placement_result(true),
        IllegalShipPlacement => handler.on_placement_result(false),
        IllegalMove => handler.on_action_rejected(RejectedAction::Move),
        IllegalSpecialAttack => handler.on_action_rejected(RejectedAction::SpecialAttack),
        IllegalAttack => handler.on_action_rejected(RejectedAction::Attack),
        NotYourTurn => handler.on_action_rejected(RejectedAction::OutOfTurn),
        IllegalGameDefinition => handler.on_illegal_game_definition(),
        MessageNotRecognized | NotInAnyGame => handler.on_server_error(report.status),
        GamePreparationsEnded => handler.on_preparations_ended(),
    }
    Ok(())
}
