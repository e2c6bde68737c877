//! Notification channels published by the session.

use salvo_notify::{Subscribers, Subscription, SubscriptionId};
use salvo_protocol::{ChatMessage, Direction, FieldSide, LobbySnapshot, Params, PlayerRecord};

use crate::{ClientState, RequestOutcome, SessionError};

/// A change to one of the playing fields.
///
/// The session does not model the fields themselves; it forwards what the
/// server reports and what the client confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEvent {
    /// Raw cell parameters of an own or enemy field update.
    Updated { side: FieldSide, params: Params },
    /// The server accepted the last move; replay it on the own field.
    ShipMoved { ship_id: u32, direction: Direction },
    /// The server accepted the last special attack.
    SpecialAttackConfirmed,
}

/// The notification categories, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    State,
    Lobby,
    Field,
    Chat,
    Error,
    OpponentJoined,
    OpponentRenamed,
    Outcome,
}

/// One subscriber list per category.
#[derive(Debug, Default)]
pub struct Notifier {
    state: Subscribers<ClientState>,
    lobby: Subscribers<LobbySnapshot>,
    field: Subscribers<FieldEvent>,
    chat: Subscribers<ChatMessage>,
    errors: Subscribers<SessionError>,
    opponent_joined: Subscribers<PlayerRecord>,
    opponent_renamed: Subscribers<PlayerRecord>,
    outcomes: Subscribers<RequestOutcome>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe_state(&mut self) -> Subscription<ClientState> {
        self.state.subscribe()
    }

    pub fn subscribe_lobby(&mut self) -> Subscription<LobbySnapshot> {
        self.lobby.subscribe()
    }

    pub fn subscribe_field(&mut self) -> Subscription<FieldEvent> {
        self.field.subscribe()
    }

    pub fn subscribe_chat(&mut self) -> Subscription<ChatMessage> {
        self.chat.subscribe()
    }

    pub fn subscribe_errors(&mut self) -> Subscription<SessionError> {
        self.errors.subscribe()
    }

    pub fn subscribe_opponent_joined(&mut self) -> Subscription<PlayerRecord> {
        self.opponent_joined.subscribe()
    }

    pub fn subscribe_opponent_renamed(&mut self) -> Subscription<PlayerRecord> {
        self.opponent_renamed.subscribe()
    }

    pub fn subscribe_outcomes(&mut self) -> Subscription<RequestOutcome> {
        self.outcomes.subscribe()
    }

    /// Removes a subscription from its category. Returns `false` if it was
    /// not registered there.
    pub fn unsubscribe(&mut self, topic: Topic, id: SubscriptionId) -> bool {
        match topic {
            Topic::State => self.state.unsubscribe(id),
            Topic::Lobby => self.lobby.unsubscribe(id),
            Topic::Field => self.field.unsubscribe(id),
            Topic::Chat => self.chat.unsubscribe(id),
            Topic::Error => self.errors.unsubscribe(id),
            Topic::OpponentJoined => self.opponent_joined.unsubscribe(id),
            Topic::OpponentRenamed => self.opponent_renamed.unsubscribe(id),
            Topic::Outcome => self.outcomes.unsubscribe(id),
        }
    }

    pub(crate) fn state(&mut self, state: ClientState) {
        self.state.publish(state);
    }

    pub(crate) fn lobby(&mut self, snapshot: LobbySnapshot) {
        self.lobby.publish(snapshot);
    }

    pub(crate) fn field(&mut self, event: FieldEvent) {
        self.field.publish(event);
    }

    pub(crate) fn chat(&mut self, message: ChatMessage) {
        self.chat.publish(message);
    }

    pub(crate) fn error(&mut self, error: SessionError) {
        tracing::debug!(%error, "publishing session error");
        self.errors.publish(error);
    }

    pub(crate) fn opponent_joined(&mut self, opponent: PlayerRecord) {
        self.opponent_joined.publish(opponent);
    }

    pub(crate) fn opponent_renamed(&mut self, opponent: PlayerRecord) {
        self.opponent_renamed.publish(opponent);
    }

    pub(crate) fn outcome(&mut self, outcome: RequestOutcome) {
        self.outcomes.publish(outcome);
    }
}
