//! The client session: one connection to the game server.
//!
//! A [`Session`] owns two background tasks:
//!
//! - a **writer** that drains a bounded queue of encoded frames onto the
//!   connection, so concurrent `send` calls are serialized without a lock
//!   around the socket;
//! - a **reader** that decodes every inbound frame, completes the matching
//!   pending request for responses, and forwards events, in arrival order,
//!   to the single [`EventStream`].
//!
//! ```text
//! send()/request() ─→ outbound queue ─→ writer ─→ Connection
//!                                                     │
//! EventStream ←── events ←── reader ←─────────────────┘
//!      pending requests ←── responses ──┘
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use lobbyist_protocol::{
    Codec, GamePrepared, GameType, JsonCodec, LobbyEvent, Request,
    RequestFrame, ResponseBody, ServerFrame, SlotDescriptor,
};
use lobbyist_transport::{Connection, WebSocketConnection};
use tokio::sync::{mpsc, oneshot};

use crate::{CredentialProvider, SessionConfig, SessionError};

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Connection state of a session.
///
/// ```text
///   Connected ──(clean close)──→ Disconnected
///       │
///       └──(transport error)──→ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not connected (closed cleanly, or never opened).
    Disconnected,
    /// Connected; requests and events flow.
    Connected,
    /// The transport failed; the session is unusable.
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connected => write!(f, "Connected"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// EventStream
// ---------------------------------------------------------------------------

/// Inbound server events, in the order the server sent them.
///
/// There is exactly one stream per session. It ends (returns `None`) when
/// the connection is gone.
pub struct EventStream {
    rx: mpsc::Receiver<LobbyEvent>,
}

impl EventStream {
    /// Waits for the next event.
    pub async fn next(&mut self) -> Option<LobbyEvent> {
        self.rx.recv().await
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

type PendingMap = HashMap<u64, oneshot::Sender<ResponseBody>>;

struct Inner {
    config: SessionConfig,
    codec: JsonCodec,
    outbound: mpsc::Sender<Vec<u8>>,
    pending: Mutex<PendingMap>,
    next_id: AtomicU64,
    state: Mutex<SessionState>,
}

impl Inner {
    fn pending(&self) -> std::sync::MutexGuard<'_, PendingMap> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Leaves `Connected` for `state`. A session that already failed or
    /// closed stays as it is.
    fn mark_closed(&self, state: SessionState) {
        let mut current =
            self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *current == SessionState::Connected {
            *current = state;
        }
    }
}

/// An authenticated connection to the game server.
///
/// Cheap to clone; all clones share the same connection. The connection is
/// closed once the last clone is dropped.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

/// Removes a pending request entry if the requesting future goes away.
struct PendingGuard<'a> {
    inner: &'a Inner,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.inner.pending().remove(&self.id);
    }
}

impl Session {
    /// Connects to `config.host:config.port` over WebSocket.
    ///
    /// # Errors
    /// Returns [`SessionError::Connect`] if the server is unreachable.
    pub async fn connect(
        config: SessionConfig,
    ) -> Result<(Self, EventStream), SessionError> {
        let conn = WebSocketConnection::connect(&config.host, config.port)
            .await
            .map_err(SessionError::Connect)?;
        tracing::info!(
            host = %config.host,
            port = config.port,
            "connected to game server"
        );
        Ok(Self::start(conn, config))
    }

    /// Starts a session over an already-open connection.
    ///
    /// Spawns the reader and writer tasks, so this must be called from
    /// within a Tokio runtime.
    pub fn start<C: Connection>(
        conn: C,
        config: SessionConfig,
    ) -> (Self, EventStream) {
        let conn = Arc::new(conn);
        let (out_tx, out_rx) =
            mpsc::channel(config.outbound_channel_capacity.max(1));
        let (event_tx, event_rx) =
            mpsc::channel(config.event_channel_capacity.max(1));

        let inner = Arc::new(Inner {
            config,
            codec: JsonCodec,
            outbound: out_tx,
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            state: Mutex::new(SessionState::Connected),
        });

        tokio::spawn(write_loop(
            Arc::clone(&conn),
            out_rx,
            Arc::downgrade(&inner),
        ));
        tokio::spawn(read_loop(conn, event_tx, Arc::downgrade(&inner)));

        (Self { inner }, EventStream { rx: event_rx })
    }

    /// Returns the current connection state.
    pub fn state(&self) -> SessionState {
        *self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the configuration this session was started with.
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Presents the secret to the server.
    ///
    /// The server does not acknowledge authentication; a bad secret shows
    /// up later as rejected requests.
    pub async fn authenticate(&self, secret: &str) -> Result<(), SessionError> {
        self.send(Request::Authenticate {
            password: secret.to_string(),
        })
        .await?;
        tracing::debug!("authentication sent");
        Ok(())
    }

    /// Fetches the secret from `provider` and authenticates with it.
    pub async fn authenticate_with(
        &self,
        provider: &impl CredentialProvider,
    ) -> Result<(), SessionError> {
        let secret = provider.secret().await?;
        self.authenticate(&secret).await
    }

    /// Sends a request without waiting for any answer.
    ///
    /// Safe to call concurrently; frames are written one at a time in the
    /// order they were queued. Returns the frame id.
    pub async fn send(&self, request: Request) -> Result<u64, SessionError> {
        let id = self.next_id();
        self.enqueue(id, request).await?;
        Ok(id)
    }

    /// Sends a request and waits for its correlated response.
    ///
    /// # Errors
    /// - [`SessionError::Timeout`] if no response arrives within
    ///   `request_timeout`
    /// - [`SessionError::Closed`] if the connection goes away first
    pub async fn request(
        &self,
        request: Request,
    ) -> Result<ResponseBody, SessionError> {
        let id = self.next_id();
        let (tx, rx) = oneshot::channel();
        self.inner.pending().insert(id, tx);
        let _guard = PendingGuard {
            inner: &self.inner,
            id,
        };

        self.enqueue(id, request).await?;

        let timeout = self.inner.config.request_timeout;
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(body)) => Ok(body),
            Ok(Err(_)) => Err(SessionError::Closed),
            Err(_) => {
                tracing::warn!(id, ?timeout, "request timed out");
                Err(SessionError::Timeout(timeout))
            }
        }
    }

    /// Asks the server to create a room with one slot per descriptor.
    ///
    /// # Errors
    /// An error response becomes [`SessionError::Rejected`] carrying the
    /// server's message.
    pub async fn prepare_game(
        &self,
        game_type: GameType,
        slots: Vec<SlotDescriptor>,
        paused: bool,
    ) -> Result<GamePrepared, SessionError> {
        let body = self
            .request(Request::PrepareGame {
                game_type,
                slots,
                paused,
            })
            .await?;
        match body {
            ResponseBody::Prepared(prepared) => {
                tracing::info!(
                    room_id = %prepared.room_id,
                    slots = prepared.reservations.len(),
                    "game prepared"
                );
                Ok(prepared)
            }
            ResponseBody::Error { message } => {
                tracing::debug!(%message, "prepare-game rejected");
                Err(SessionError::Rejected { message })
            }
        }
    }

    fn next_id(&self) -> u64 {
        self.inner.next_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn enqueue(
        &self,
        id: u64,
        request: Request,
    ) -> Result<(), SessionError> {
        if self.state() != SessionState::Connected {
            return Err(SessionError::Closed);
        }
        let bytes = self.inner.codec.encode(&RequestFrame { id, request })?;
        self.inner
            .outbound
            .send(bytes)
            .await
            .map_err(|_| SessionError::Closed)
    }
}

async fn write_loop<C: Connection>(
    conn: Arc<C>,
    mut rx: mpsc::Receiver<Vec<u8>>,
    inner: Weak<Inner>,
) {
    while let Some(bytes) = rx.recv().await {
        if let Err(e) = conn.send(&bytes).await {
            tracing::error!(conn = %conn.id(), error = %e, "send failed");
            if let Some(inner) = inner.upgrade() {
                inner.mark_closed(SessionState::Failed);
            }
            return;
        }
    }

    // Every Session clone is gone.
    tracing::debug!(conn = %conn.id(), "writer finished, closing connection");
    let _ = conn.close().await;
}

async fn read_loop<C: Connection>(
    conn: Arc<C>,
    events: mpsc::Sender<LobbyEvent>,
    inner: Weak<Inner>,
) {
    let codec = JsonCodec;
    let end_state = loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(conn = %conn.id(), "connection closed");
                break SessionState::Disconnected;
            }
            Err(e) => {
                tracing::error!(conn = %conn.id(), error = %e, "receive failed");
                break SessionState::Failed;
            }
        };

        let frame: ServerFrame = match codec.decode(&data) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "dropping undecodable frame");
                continue;
            }
        };

        match frame {
            ServerFrame::Response(response) => {
                let Some(inner) = inner.upgrade() else {
                    break SessionState::Disconnected;
                };
                let waiter = inner.pending().remove(&response.id);
                match waiter {
                    Some(tx) => {
                        let _ = tx.send(response.body);
                    }
                    None => tracing::warn!(
                        id = response.id,
                        "response for unknown or expired request"
                    ),
                }
            }
            ServerFrame::Event(event) => {
                tracing::trace!(
                    kind = event.kind(),
                    room_id = %event.room_id(),
                    "event received"
                );
                if events.send(event).await.is_err() {
                    tracing::debug!("event stream dropped, discarding event");
                }
            }
        }
    };

    if let Some(inner) = inner.upgrade() {
        inner.mark_closed(end_state);
        // Dropping the senders wakes every waiter with `Closed`.
        inner.pending().clear();
    }
}
