//! The client actor and its handle.
//!
//! One Tokio task owns the [`ClientSession`] and the current
//! [`Connection`]. Two inputs feed it: commands from [`SalvoClient`]
//! handles (any number of caller tasks) and [`Inbound`] events from the
//! connection's receive loop. Both are processed one at a time, so the
//! session's state and lobby never see concurrent access.
//!
//! ```text
//! caller tasks ──SalvoClient──→ ┌─────────────┐ ──send──→ server
//!                               │ ClientActor │
//! receive loop ──Inbound──────→ └─────────────┘ ──notify──→ subscribers
//! ```

use std::net::SocketAddr;
use std::time::Instant;

use salvo_notify::{Subscription, SubscriptionId};
use salvo_protocol::{
    ChatMessage, ClientRequest, Codec, Coordinate, Direction, LobbySnapshot, PlayerRecord,
    ShipPlacement,
};
use salvo_session::{
    ClientSession, ClientState, FieldEvent, Notifier, OwnGame, RequestOutcome, SessionError,
    Topic,
};
use salvo_transport::{Connection, Inbound, InboundEvent, TransportError};
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;

use crate::{ClientConfig, SalvoClientBuilder, SalvoError};

/// A point-in-time copy of the client's view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSnapshot {
    pub state: ClientState,
    pub nickname: String,
    pub lobby: LobbySnapshot,
    pub own_game: Option<OwnGame>,
    /// The server the client is connected to.
    pub server: Option<SocketAddr>,
}

/// A user operation that may produce a request to the server.
#[derive(Debug)]
enum Operation {
    SetNickname(String),
    JoinGame(String),
    CreateGame(String),
    LeaveGame,
    SubmitBoard(Vec<ShipPlacement>),
    Attack(Coordinate),
    SpecialAttack(Coordinate),
    MoveShip { ship_id: u32, direction: Direction },
    Surrender,
    Chat(String),
}

type NotifierFn = Box<dyn FnOnce(&mut Notifier) + Send>;

enum ClientCommand {
    Connect {
        host: String,
        port: u16,
        nickname: String,
        reply: oneshot::Sender<Result<(), SalvoError>>,
    },
    Disconnect {
        reply: oneshot::Sender<()>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
    Request {
        op: Operation,
        reply: oneshot::Sender<Result<(), SalvoError>>,
    },
    WithNotifier(NotifierFn),
    Snapshot {
        reply: oneshot::Sender<ClientSnapshot>,
    },
    Shutdown,
}

/// Handle to a running client. Cheap to clone; every clone talks to the
/// same actor.
///
/// ## Example
///
/// ```rust,no_run
/// use salvo::prelude::*;
///
/// # async fn example() -> Result<(), SalvoError> {
/// let client = SalvoClient::builder().build();
/// let mut states = client.subscribe_state().await?;
///
/// client.connect("127.0.0.1", 4000, "Ada").await?;
/// client.create_game("armada").await?;
///
/// while let Some(state) = states.recv().await {
///     println!("now {state}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SalvoClient {
    sender: mpsc::Sender<ClientCommand>,
}

impl SalvoClient {
    pub fn builder() -> SalvoClientBuilder {
        SalvoClientBuilder::new()
    }

    /// Spawns the actor. Prefer [`SalvoClient::builder`].
    pub fn start<C: Codec + Clone>(config: ClientConfig, codec: C) -> Self {
        let (sender, commands) = mpsc::channel(config.command_buffer.max(1));
        let (inbound_tx, inbound_rx) = mpsc::channel(config.inbound_buffer.max(1));

        let actor = ClientActor {
            session: ClientSession::new(config.session.clone()),
            config,
            codec,
            connection: None,
            commands,
            inbound_tx,
            inbound_rx,
        };
        tokio::spawn(actor.run());

        Self { sender }
    }

    // -----------------------------------------------------------------------
    // Connection
    // -----------------------------------------------------------------------

    /// Connects to a server and announces `nickname`. An existing
    /// connection is closed first.
    ///
    /// # Errors
    /// [`SalvoError::Transport`] if the server cannot be reached. The
    /// client stays `NotConnected` in that case.
    pub async fn connect(
        &self,
        host: impl Into<String>,
        port: u16,
        nickname: impl Into<String>,
    ) -> Result<(), SalvoError> {
        let (reply, rx) = oneshot::channel();
        self.send(ClientCommand::Connect {
            host: host.into(),
            port,
            nickname: nickname.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| SalvoError::ClientStopped)?
    }

    /// Leaves the current game, closes the connection and forgets the
    /// lobby. Safe to call when not connected.
    pub async fn disconnect(&self) -> Result<(), SalvoError> {
        let (reply, rx) = oneshot::channel();
        self.send(ClientCommand::Disconnect { reply }).await?;
        rx.await.map_err(|_| SalvoError::ClientStopped)
    }

    /// Like [`disconnect`](Self::disconnect), logged as a reset. The
    /// nickname is kept for the next connect.
    pub async fn reset(&self) -> Result<(), SalvoError> {
        let (reply, rx) = oneshot::channel();
        self.send(ClientCommand::Reset { reply }).await?;
        rx.await.map_err(|_| SalvoError::ClientStopped)
    }

    /// Stops the actor, closing any connection.
    pub async fn shutdown(&self) {
        let _ = self.sender.send(ClientCommand::Shutdown).await;
    }

    pub fn is_running(&self) -> bool {
        !self.sender.is_closed()
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    pub async fn set_nickname(&self, name: impl Into<String>) -> Result<(), SalvoError> {
        self.request(Operation::SetNickname(name.into())).await
    }

    pub async fn join_game(&self, name: impl Into<String>) -> Result<(), SalvoError> {
        self.request(Operation::JoinGame(name.into())).await
    }

    pub async fn create_game(&self, name: impl Into<String>) -> Result<(), SalvoError> {
        self.request(Operation::CreateGame(name.into())).await
    }

    pub async fn leave_game(&self) -> Result<(), SalvoError> {
        self.request(Operation::LeaveGame).await
    }

    pub async fn submit_board(&self, ships: Vec<ShipPlacement>) -> Result<(), SalvoError> {
        self.request(Operation::SubmitBoard(ships)).await
    }

    pub async fn attack(&self, target: Coordinate) -> Result<(), SalvoError> {
        self.request(Operation::Attack(target)).await
    }

    pub async fn special_attack(&self, target: Coordinate) -> Result<(), SalvoError> {
        self.request(Operation::SpecialAttack(target)).await
    }

    pub async fn move_ship(&self, ship_id: u32, direction: Direction) -> Result<(), SalvoError> {
        self.request(Operation::MoveShip { ship_id, direction }).await
    }

    pub async fn surrender(&self) -> Result<(), SalvoError> {
        self.request(Operation::Surrender).await
    }

    pub async fn send_chat(&self, text: impl Into<String>) -> Result<(), SalvoError> {
        self.request(Operation::Chat(text.into())).await
    }

    // -----------------------------------------------------------------------
    // Queries and subscriptions
    // -----------------------------------------------------------------------

    pub async fn snapshot(&self) -> Result<ClientSnapshot, SalvoError> {
        let (reply, rx) = oneshot::channel();
        self.send(ClientCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| SalvoError::ClientStopped)
    }

    pub async fn state(&self) -> Result<ClientState, SalvoError> {
        Ok(self.snapshot().await?.state)
    }

    /// Runs `f` against the session's notifier inside the actor.
    pub async fn with_notifier<T, F>(&self, f: F) -> Result<T, SalvoError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Notifier) -> T + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let call: NotifierFn = Box::new(move |notifier| {
            let _ = tx.send(f(notifier));
        });
        self.send(ClientCommand::WithNotifier(call)).await?;
        rx.await.map_err(|_| SalvoError::ClientStopped)
    }

    pub async fn subscribe_state(&self) -> Result<Subscription<ClientState>, SalvoError> {
        self.with_notifier(Notifier::subscribe_state).await
    }

    pub async fn subscribe_lobby(&self) -> Result<Subscription<LobbySnapshot>, SalvoError> {
        self.with_notifier(Notifier::subscribe_lobby).await
    }

    pub async fn subscribe_field(&self) -> Result<Subscription<FieldEvent>, SalvoError> {
        self.with_notifier(Notifier::subscribe_field).await
    }

    pub async fn subscribe_chat(&self) -> Result<Subscription<ChatMessage>, SalvoError> {
        self.with_notifier(Notifier::subscribe_chat).await
    }

    pub async fn subscribe_errors(&self) -> Result<Subscription<SessionError>, SalvoError> {
        self.with_notifier(Notifier::subscribe_errors).await
    }

    pub async fn subscribe_opponent_joined(&self) -> Result<Subscription<PlayerRecord>, SalvoError> {
        self.with_notifier(Notifier::subscribe_opponent_joined).await
    }

    pub async fn subscribe_opponent_renamed(
        &self,
    ) -> Result<Subscription<PlayerRecord>, SalvoError> {
        self.with_notifier(Notifier::subscribe_opponent_renamed).await
    }

    pub async fn subscribe_outcomes(&self) -> Result<Subscription<RequestOutcome>, SalvoError> {
        self.with_notifier(Notifier::subscribe_outcomes).await
    }

    pub async fn unsubscribe(&self, topic: Topic, id: SubscriptionId) -> Result<bool, SalvoError> {
        self.with_notifier(move |notifier| notifier.unsubscribe(topic, id))
            .await
    }

    async fn request(&self, op: Operation) -> Result<(), SalvoError> {
        let (reply, rx) = oneshot::channel();
        self.send(ClientCommand::Request { op, reply }).await?;
        rx.await.map_err(|_| SalvoError::ClientStopped)?
    }

    async fn send(&self, cmd: ClientCommand) -> Result<(), SalvoError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| SalvoError::ClientStopped)
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

struct ClientActor<C: Codec + Clone> {
    config: ClientConfig,
    codec: C,
    session: ClientSession,
    connection: Option<Connection<C>>,
    commands: mpsc::Receiver<ClientCommand>,
    /// Cloned into every connection; the actor keeps one sender so the
    /// receiver never closes.
    inbound_tx: mpsc::Sender<Inbound>,
    inbound_rx: mpsc::Receiver<Inbound>,
}

impl<C: Codec + Clone> ClientActor<C> {
    async fn run(mut self) {
        tracing::info!("client actor started");

        let mut expiry = tokio::time::interval(self.config.expiry_check_interval);
        expiry.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(ClientCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd).await,
                },
                Some(inbound) = self.inbound_rx.recv() => self.handle_inbound(inbound),
                _ = expiry.tick() => self.session.expire_pending(Instant::now()),
            }
        }

        self.close("client shutting down").await;
        tracing::info!("client actor stopped");
    }

    async fn handle_command(&mut self, cmd: ClientCommand) {
        match cmd {
            ClientCommand::Connect {
                host,
                port,
                nickname,
                reply,
            } => {
                let result = self.connect(&host, port, nickname).await;
                let _ = reply.send(result);
            }
            ClientCommand::Disconnect { reply } => {
                self.close("disconnect requested").await;
                let _ = reply.send(());
            }
            ClientCommand::Reset { reply } => {
                self.close("reset requested").await;
                let _ = reply.send(());
            }
            ClientCommand::Request { op, reply } => {
                let result = self.perform(op).await;
                let _ = reply.send(result);
            }
            ClientCommand::WithNotifier(f) => f(self.session.notifier_mut()),
            ClientCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            // Handled by the loop.
            ClientCommand::Shutdown => {}
        }
    }

    fn handle_inbound(&mut self, inbound: Inbound) {
        let current = self.connection.as_ref().map(Connection::id);
        if current != Some(inbound.conn) {
            tracing::trace!(conn = %inbound.conn, "dropping event from a replaced connection");
            return;
        }

        match inbound.event {
            InboundEvent::Report(report) => self.session.handle_report(report),
            InboundEvent::Closed { reason } => {
                self.connection = None;
                self.session.connection_lost(reason);
            }
        }
    }

    async fn connect(&mut self, host: &str, port: u16, nickname: String) -> Result<(), SalvoError> {
        self.close("reconnecting").await;
        self.session.set_nickname(nickname);

        let connection =
            Connection::connect(host, port, self.codec.clone(), self.inbound_tx.clone()).await?;
        self.connection = Some(connection);

        if let Some(request) = self.session.connected() {
            self.send(&request).await?;
        }
        Ok(())
    }

    /// Runs a session operation and sends the request it produced. A
    /// refused operation sends nothing.
    async fn perform(&mut self, op: Operation) -> Result<(), SalvoError> {
        let request = match op {
            Operation::SetNickname(name) => match self.session.set_nickname(name) {
                Some(request) => request,
                None => return Ok(()),
            },
            Operation::JoinGame(name) => self.session.join_game(name)?,
            Operation::CreateGame(name) => self.session.create_game(name)?,
            Operation::LeaveGame => self.session.leave_game()?,
            Operation::SubmitBoard(ships) => self.session.submit_board(ships)?,
            Operation::Attack(target) => self.session.attack(target)?,
            Operation::SpecialAttack(target) => self.session.special_attack(target)?,
            Operation::MoveShip { ship_id, direction } => {
                self.session.move_ship(ship_id, direction)?
            }
            Operation::Surrender => self.session.surrender()?,
            Operation::Chat(text) => self.session.send_chat(text)?,
        };
        self.send(&request).await
    }

    async fn send(&self, request: &ClientRequest) -> Result<(), SalvoError> {
        let Some(connection) = &self.connection else {
            tracing::warn!(kind = request.kind(), "cannot send: not connected");
            return Err(TransportError::NotConnected.into());
        };
        connection.send_request(request).await?;
        Ok(())
    }

    /// Closes the connection (if any) and resets the session.
    async fn close(&mut self, why: &str) {
        if let Some(connection) = self.connection.take() {
            tracing::info!(peer = %connection.peer_addr(), why, "closing connection");
            connection.disconnect().await;
        }
        if self.session.state().is_connected() {
            self.session.reset();
        }
    }

    fn snapshot(&self) -> ClientSnapshot {
        let lobby = self.session.lobby();
        ClientSnapshot {
            state: self.session.state(),
            nickname: lobby.nickname().to_string(),
            lobby: lobby.snapshot(),
            own_game: lobby.own_game().cloned(),
            server: self.connection.as_ref().map(Connection::peer_addr),
        }
    }
}
