//! Error types for the session layer.

use crate::RequestKind;

/// Everything that can go wrong for a session operation.
///
/// Local guard failures and server rejections share this type: both are
/// returned to the caller and published on the error channel, so a UI
/// needs a single failure path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("not connected to a server")]
    NotConnected,

    /// Attack, special attack and move require the client's turn.
    #[error("It is not your turn.")]
    NotYourTurn,

    #[error("ships can only be placed during game preparations")]
    NotPlacing,

    #[error("already part of a game")]
    AlreadyInGame,

    /// A request of the same slot is still waiting for the server.
    #[error("a {0} request is still pending")]
    RequestPending(RequestKind),

    #[error("the board was already sent for this round")]
    BoardAlreadySent,

    #[error("Move not allowed")]
    IllegalMove,

    #[error("Special Attack not allowed")]
    IllegalSpecialAttack,

    #[error("Attack not allowed")]
    IllegalAttack,

    #[error("Failed to place ships")]
    IllegalPlacement,

    #[error("joining game {game} was denied")]
    JoinDenied { game: String },

    #[error("illegal game definition for {game}")]
    IllegalGameDefinition { game: String },

    #[error("the server did not recognize the last message")]
    MessageNotRecognized,

    #[error("not in any game")]
    NotInAnyGame,

    #[error("the server did not answer the {0} request in time")]
    TimedOut(RequestKind),

    #[error("lost connection to the server: {0}")]
    ConnectionLost(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_messages_match_ui_texts() {
        assert_eq!(SessionError::NotYourTurn.to_string(), "It is not your turn.");
        assert_eq!(SessionError::IllegalMove.to_string(), "Move not allowed");
        assert_eq!(
            SessionError::TimedOut(RequestKind::SpecialAttack).to_string(),
            "the server did not answer the special attack request in time"
        );
    }
}
