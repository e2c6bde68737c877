//! The discovery actor.
//!
//! One task owns the UDP socket and the [`ServerRegistry`]. Each cycle it
//! broadcasts the challenge and listens for the configured window; every
//! acknowledgement from an address not seen before publishes the full set.
//! The outside world talks to it through a [`DiscoveryHandle`].

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use rand::Rng;
use salvo_notify::{Subscribers, Subscription, SubscriptionId};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep, timeout_at};

use crate::{DiscoveryConfig, DiscoveryError, ServerRegistry};

/// Largest datagram we bother reading. Both payloads are far shorter.
const MAX_DATAGRAM: usize = 512;

/// Capacity of the command channel.
const COMMAND_BUFFER: usize = 16;

enum DiscoveryCommand {
    Subscribe {
        reply: oneshot::Sender<Subscription<Vec<IpAddr>>>,
    },
    Unsubscribe {
        id: SubscriptionId,
    },
    Servers {
        reply: oneshot::Sender<Vec<IpAddr>>,
    },
    Reset,
    Stop,
}

/// A bound, not yet running discovery service.
///
/// ## Example
///
/// ```rust,no_run
/// use salvo_discovery::{DiscoveryConfig, DiscoveryService};
///
/// # async fn example() -> Result<(), salvo_discovery::DiscoveryError> {
/// let mut service = DiscoveryService::bind(DiscoveryConfig::default()).await?;
/// let mut found = service.subscribe();
/// let handle = service.start();
///
/// if let Some(servers) = found.recv().await {
///     println!("servers: {servers:?}");
/// }
/// handle.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct DiscoveryService {
    config: DiscoveryConfig,
    socket: UdpSocket,
    subscribers: Subscribers<Vec<IpAddr>>,
}

impl DiscoveryService {
    /// Binds the discovery socket and enables broadcasting on it.
    pub async fn bind(config: DiscoveryConfig) -> Result<Self, DiscoveryError> {
        let socket = UdpSocket::bind(config.bind_addr)
            .await
            .map_err(DiscoveryError::Bind)?;
        socket.set_broadcast(true).map_err(DiscoveryError::Broadcast)?;

        Ok(Self {
            config,
            socket,
            subscribers: Subscribers::new(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Subscribes before the loop starts, so no notification is missed.
    pub fn subscribe(&mut self) -> Subscription<Vec<IpAddr>> {
        self.subscribers.subscribe()
    }

    /// Spawns the discovery loop.
    pub fn start(self) -> DiscoveryHandle {
        let (sender, receiver) = mpsc::channel(COMMAND_BUFFER);
        let actor = DiscoveryActor {
            config: self.config,
            socket: self.socket,
            subscribers: self.subscribers,
            registry: ServerRegistry::new(),
            receiver,
        };
        tokio::spawn(actor.run());
        DiscoveryHandle { sender }
    }
}

/// Handle to a running discovery loop. Cheap to clone.
#[derive(Clone)]
pub struct DiscoveryHandle {
    sender: mpsc::Sender<DiscoveryCommand>,
}

impl DiscoveryHandle {
    pub async fn subscribe(&self) -> Result<Subscription<Vec<IpAddr>>, DiscoveryError> {
        let (reply, rx) = oneshot::channel();
        self.send(DiscoveryCommand::Subscribe { reply }).await?;
        rx.await.map_err(|_| DiscoveryError::Stopped)
    }

    pub async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), DiscoveryError> {
        self.send(DiscoveryCommand::Unsubscribe { id }).await
    }

    /// The servers found so far.
    pub async fn servers(&self) -> Result<Vec<IpAddr>, DiscoveryError> {
        let (reply, rx) = oneshot::channel();
        self.send(DiscoveryCommand::Servers { reply }).await?;
        rx.await.map_err(|_| DiscoveryError::Stopped)
    }

    /// Forgets every server found so far. The next answer from any of them
    /// is reported again.
    pub async fn reset(&self) -> Result<(), DiscoveryError> {
        self.send(DiscoveryCommand::Reset).await
    }

    /// Stops the loop. Safe to call after it already stopped.
    pub async fn stop(&self) {
        let _ = self.sender.send(DiscoveryCommand::Stop).await;
    }

    pub fn is_running(&self) -> bool {
        !self.sender.is_closed()
    }

    async fn send(&self, cmd: DiscoveryCommand) -> Result<(), DiscoveryError> {
        self.sender.send(cmd).await.map_err(|_| DiscoveryError::Stopped)
    }
}

struct DiscoveryActor {
    config: DiscoveryConfig,
    socket: UdpSocket,
    subscribers: Subscribers<Vec<IpAddr>>,
    registry: ServerRegistry,
    receiver: mpsc::Receiver<DiscoveryCommand>,
}

impl DiscoveryActor {
    async fn run(mut self) {
        let target = self.config.target();
        tracing::info!(%target, "discovery started");

        let jitter = self.initial_jitter();
        if !jitter.is_zero() {
            sleep(jitter).await;
        }

        let mut buf = [0u8; MAX_DATAGRAM];
        'cycles: loop {
            self.broadcast(target).await;
            let deadline = Instant::now() + self.config.listen_window;

            loop {
                tokio::select! {
                    cmd = self.receiver.recv() => match cmd {
                        Some(DiscoveryCommand::Stop) | None => break 'cycles,
                        Some(cmd) => self.handle_command(cmd),
                    },
                    received = timeout_at(deadline, self.socket.recv_from(&mut buf)) => match received {
                        // Window over, with or without answers.
                        Err(_) => break,
                        Ok(Ok((len, from))) => self.handle_datagram(&buf[..len], from),
                        Ok(Err(e)) => {
                            tracing::warn!(error = %e, "discovery receive failed");
                            tokio::time::sleep_until(deadline).await;
                            break;
                        }
                    },
                }
            }
        }

        tracing::info!(found = self.registry.len(), "discovery stopped");
    }

    fn initial_jitter(&self) -> Duration {
        let max = u64::try_from(self.config.initial_jitter.as_millis()).unwrap_or(u64::MAX);
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..max))
    }

    async fn broadcast(&self, target: SocketAddr) {
        match self.socket.send_to(self.config.challenge.as_bytes(), target).await {
            Ok(_) => tracing::trace!(%target, "challenge sent"),
            Err(e) => tracing::warn!(%target, error = %e, "failed to send discovery challenge"),
        }
    }

    fn handle_datagram(&mut self, payload: &[u8], from: SocketAddr) {
        if payload != self.config.acknowledgement.as_bytes() {
            tracing::trace!(%from, len = payload.len(), "ignoring datagram");
            return;
        }
        if !self.registry.record(from.ip()) {
            return;
        }

        tracing::info!(server = %from.ip(), "server discovered");
        self.subscribers.publish(self.registry.servers().to_vec());
    }

    fn handle_command(&mut self, cmd: DiscoveryCommand) {
        match cmd {
            DiscoveryCommand::Subscribe { reply } => {
                let _ = reply.send(self.subscribers.subscribe());
            }
            DiscoveryCommand::Unsubscribe { id } => {
                self.subscribers.unsubscribe(id);
            }
            DiscoveryCommand::Servers { reply } => {
                let _ = reply.send(self.registry.servers().to_vec());
            }
            DiscoveryCommand::Reset => {
                tracing::debug!(forgotten = self.registry.len(), "discovery reset");
                self.registry.reset();
            }
            // Handled by the loop.
            DiscoveryCommand::Stop => {}
        }
    }
}
