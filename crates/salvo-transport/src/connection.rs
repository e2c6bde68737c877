//! The client side of one server connection.

use std::net::SocketAddr;
use std::sync::Arc;

use salvo_protocol::{ClientRequest, Codec, Message, ProtocolError, Report, TextCodec, encode_frame};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, mpsc, watch};

use crate::{ConnectionId, TransportError, read_frame};

/// An event produced by a connection's receive loop.
#[derive(Debug, Clone)]
pub struct Inbound {
    /// The connection the event came from.
    pub conn: ConnectionId,
    pub event: InboundEvent,
}

#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// A decoded report whose status is in the closed table.
    Report(Report),
    /// The stream failed or the server closed it. No further events follow
    /// from this connection.
    Closed { reason: String },
}

/// One persistent, framed TCP connection to a Battleship++ server.
///
/// The read half lives in a background receive loop spawned by
/// [`Connection::connect`]. Every decoded report is forwarded through the
/// `inbound` channel handed to `connect`, which is the only way data
/// leaves the loop. The write half stays here, behind a mutex, so
/// [`send`](Self::send) can run concurrently with the loop reading.
///
/// ## Example
///
/// ```rust,no_run
/// use salvo_protocol::{Message, TextCodec};
/// use salvo_transport::{Connection, InboundEvent};
/// use tokio::sync::mpsc;
///
/// # async fn example() -> Result<(), salvo_transport::TransportError> {
/// let (tx, mut rx) = mpsc::channel(64);
/// let conn = Connection::connect("127.0.0.1", 4000, TextCodec, tx).await?;
/// conn.send(&Message::new("nickname_set").with_param("name", "Ada")).await?;
///
/// while let Some(inbound) = rx.recv().await {
///     match inbound.event {
///         InboundEvent::Report(report) => println!("{}", report.status),
///         InboundEvent::Closed { reason } => {
///             println!("closed: {reason}");
///             break;
///         }
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct Connection<C: Codec = TextCodec> {
    id: ConnectionId,
    peer: SocketAddr,
    codec: Arc<C>,
    writer: Mutex<Option<OwnedWriteHalf>>,
    stop: watch::Sender<bool>,
}

impl<C: Codec> Connection<C> {
    /// Opens a stream to `host:port` and starts the receive loop.
    ///
    /// # Errors
    /// Returns [`TransportError::ConnectFailed`] on any network failure.
    /// Nothing is spawned in that case.
    pub async fn connect(
        host: &str,
        port: u16,
        codec: C,
        inbound: mpsc::Sender<Inbound>,
    ) -> Result<Self, TransportError> {
        let addr = format!("{host}:{port}");
        let stream = TcpStream::connect((host, port)).await.map_err(|source| {
            tracing::warn!(%addr, error = %source, "failed to connect");
            TransportError::ConnectFailed {
                addr: addr.clone(),
                source,
            }
        })?;

        let peer = stream
            .peer_addr()
            .map_err(|source| TransportError::ConnectFailed {
                addr: addr.clone(),
                source,
            })?;
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(%peer, error = %e, "could not disable Nagle");
        }

        let id = ConnectionId::next();
        let (reader, writer) = stream.into_split();
        let (stop, stop_rx) = watch::channel(false);
        let codec = Arc::new(codec);

        tokio::spawn(receive_loop(id, reader, Arc::clone(&codec), inbound, stop_rx));
        tracing::info!(%id, %peer, "connected to server");

        Ok(Self {
            id,
            peer,
            codec,
            writer: Mutex::new(Some(writer)),
            stop,
        })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Encodes and writes one message.
    ///
    /// A write failure is logged as a lost connection and returned, but it
    /// does not stop the receive loop; the loop reports the loss on its
    /// own once the read side fails too.
    ///
    /// # Errors
    /// - [`TransportError::NotConnected`] after [`disconnect`](Self::disconnect).
    /// - [`TransportError::Protocol`] if the message cannot be framed.
    /// - [`TransportError::SendFailed`] if the write fails.
    pub async fn send(&self, msg: &Message) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        let Some(stream) = writer.as_mut() else {
            tracing::warn!(id = %self.id, kind = %msg.kind, "cannot send: not connected");
            return Err(TransportError::NotConnected);
        };

        let frame = encode_frame(self.codec.as_ref(), msg)?;
        stream.write_all(&frame).await.map_err(|e| {
            tracing::error!(id = %self.id, kind = %msg.kind, error = %e, "lost connection while sending");
            TransportError::SendFailed(e)
        })?;

        tracing::debug!(id = %self.id, kind = %msg.kind, len = frame.len(), "message sent");
        Ok(())
    }

    /// Shorthand for sending a typed request.
    pub async fn send_request(&self, request: &ClientRequest) -> Result<(), TransportError> {
        self.send(&request.to_message()).await
    }

    /// Whether [`disconnect`](Self::disconnect) has not been called yet.
    pub async fn is_open(&self) -> bool {
        self.writer.lock().await.is_some()
    }

    /// Stops the receive loop, tells the server we leave the current game,
    /// and closes the stream.
    ///
    /// Safe to call more than once. Failures are logged, never returned.
    pub async fn disconnect(&self) {
        self.stop.send_replace(true);

        let Some(mut stream) = self.writer.lock().await.take() else {
            tracing::debug!(id = %self.id, "already disconnected");
            return;
        };

        match encode_frame(self.codec.as_ref(), &ClientRequest::AbortGame.to_message()) {
            Ok(frame) => {
                if let Err(e) = stream.write_all(&frame).await {
                    tracing::debug!(id = %self.id, error = %e, "could not send leave notification");
                }
            }
            Err(e) => tracing::warn!(id = %self.id, error = %e, "could not encode leave notification"),
        }
        if let Err(e) = stream.shutdown().await {
            tracing::debug!(id = %self.id, error = %e, "shutdown failed");
        }

        tracing::info!(id = %self.id, peer = %self.peer, "disconnected from server");
    }
}

impl<C: Codec> Drop for Connection<C> {
    fn drop(&mut self) {
        self.stop.send_replace(true);
    }
}

impl<C: Codec> std::fmt::Debug for Connection<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Receive loop
// ---------------------------------------------------------------------------

async fn receive_loop<C: Codec>(
    id: ConnectionId,
    mut reader: OwnedReadHalf,
    codec: Arc<C>,
    inbound: mpsc::Sender<Inbound>,
    mut stop: watch::Receiver<bool>,
) {
    tracing::debug!(%id, "receive loop started");

    loop {
        let frame = tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow_and_update() {
                    break;
                }
                continue;
            }
            frame = read_frame(&mut reader) => frame,
        };

        let body = match frame {
            Ok(body) => body,
            Err(e) => {
                if *stop.borrow() {
                    break;
                }
                tracing::error!(%id, error = %e, "lost connection to server");
                let closed = Inbound {
                    conn: id,
                    event: InboundEvent::Closed {
                        reason: e.to_string(),
                    },
                };
                let _ = inbound.send(closed).await;
                break;
            }
        };

        match decode_report(codec.as_ref(), &body) {
            Ok(report) => {
                tracing::debug!(%id, status = %report.status, "report received");
                let event = Inbound {
                    conn: id,
                    event: InboundEvent::Report(report),
                };
                if inbound.send(event).await.is_err() {
                    tracing::debug!(%id, "inbound receiver dropped");
                    break;
                }
            }
            Err(ProtocolError::UnknownStatus(code)) => {
                tracing::debug!(%id, code, "ignoring unknown status code");
            }
            Err(e) => {
                tracing::warn!(%id, error = %e, len = body.len(), "dropping malformed frame");
            }
        }
    }

    tracing::debug!(%id, "receive loop stopped");
}

fn decode_report<C: Codec + ?Sized>(codec: &C, body: &[u8]) -> Result<Report, ProtocolError> {
    let msg = codec.decode(body)?;
    Report::try_from(msg)
}
