use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::{ConnectInfo, State},
    http::{header, HeaderMap},
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{ConnectionError, RelayError};

/// How long `shutdown` waits for the active peer to flush queued commands.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Identity of one timer client session.
#[derive(Debug, Clone)]
pub struct PeerInfo {
    pub id: Uuid,
    pub origin: String,
    pub addr: SocketAddr,
}

impl fmt::Display for PeerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.origin, self.addr)
    }
}

struct Peer {
    info: PeerInfo,
    outbound: mpsc::UnboundedSender<String>,
    finished: oneshot::Receiver<()>,
}

struct Shared {
    active: Mutex<Option<Peer>>,
    connected: watch::Sender<bool>,
    server: Mutex<Option<AbortHandle>>,
    /// Set once a drop has been reported for the current disconnected period.
    dropping: AtomicBool,
}

/// Single-slot WebSocket connection to the remote split timer.
///
/// The accept loop runs on its own task; `connected` and `send` may be called
/// from anywhere. A new handshake always replaces the current peer.
#[derive(Clone)]
pub struct TimerConnection {
    shared: Arc<Shared>,
    local_addr: Option<SocketAddr>,
}

impl Default for TimerConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerConnection {
    /// A connection handle with no listener behind it. Every send is dropped
    /// until a peer is attached through [`TimerConnection::listen`].
    pub fn new() -> Self {
        let (connected, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                active: Mutex::new(None),
                connected,
                server: Mutex::new(None),
                dropping: AtomicBool::new(false),
            }),
            local_addr: None,
        }
    }

    /// Bind `host:port` and start accepting timer clients in the background.
    pub async fn listen(host: &str, port: u16) -> Result<Self, RelayError> {
        let listener = tokio::net::TcpListener::bind((host, port))
            .await
            .map_err(|source| RelayError::Bind {
                host: host.to_string(),
                port,
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| RelayError::Bind {
            host: host.to_string(),
            port,
            source,
        })?;

        let mut connection = Self::new();
        connection.local_addr = Some(local_addr);

        let app = Router::new()
            .route("/", get(ws_handler))
            .fallback(ws_handler)
            .with_state(connection.clone());

        let task = tokio::spawn(async move {
            let service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(err) = axum::serve(listener, service).await {
                error!("timer server stopped: {}", err);
            }
        });
        *connection.shared.server.lock() = Some(task.abort_handle());

        debug!("timer server bound to {}", local_addr);
        Ok(connection)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn connected(&self) -> bool {
        self.shared.active.lock().is_some()
    }

    /// The currently attached peer, if any.
    pub fn peer(&self) -> Option<PeerInfo> {
        self.shared.active.lock().as_ref().map(|p| p.info.clone())
    }

    /// Resolve once a timer client has completed its handshake.
    pub async fn wait_connected(&self) -> Result<()> {
        let mut rx = self.shared.connected.subscribe();
        rx.wait_for(|up| *up).await.map(|_| ())?;
        Ok(())
    }

    /// Best-effort write of one text frame to the active peer.
    ///
    /// Without a peer the command is dropped. Only the first drop of a
    /// disconnected period is a warning; the rest go to debug.
    pub fn send(&self, command: &str, log: bool) {
        let mut active = self.shared.active.lock();
        let Some(peer) = active.as_ref() else {
            if self.shared.dropping.swap(true, Ordering::Relaxed) {
                debug!("no timer connected, dropping '{}'", command);
            } else {
                warn!("no timer connected, dropping commands until one attaches");
            }
            return;
        };

        if log {
            info!("[send] {}", command);
        }
        if peer.outbound.send(command.to_string()).is_err() {
            warn!(
                "connection to {} lost while sending '{}'",
                peer.info, command
            );
            *active = None;
            self.shared.connected.send_replace(false);
        }
    }

    /// Detach the active peer after its queued frames are flushed, then stop
    /// accepting new clients.
    pub async fn shutdown(&self) {
        let peer = self.shared.active.lock().take();
        self.shared.connected.send_replace(false);

        if let Some(Peer {
            info,
            outbound,
            finished,
        }) = peer
        {
            drop(outbound);
            if tokio::time::timeout(DRAIN_GRACE, finished).await.is_err() {
                warn!("timer client {} did not drain in time", info);
            }
        }

        if let Some(server) = self.shared.server.lock().take() {
            server.abort();
        }
    }

    fn attach(&self, peer: Peer) {
        let mut active = self.shared.active.lock();
        if let Some(previous) = active.replace(peer) {
            info!("[replace] {} superseded by a new handshake", previous.info);
        }
        self.shared.dropping.store(false, Ordering::Relaxed);
        self.shared.connected.send_replace(true);
    }

    /// Attach an in-process peer whose frames land in the returned receiver.
    #[cfg(test)]
    pub(crate) fn attach_channel(&self) -> mpsc::UnboundedReceiver<String> {
        let (outbound, rx) = mpsc::unbounded_channel();
        let (_, finished) = oneshot::channel();
        self.attach(Peer {
            info: PeerInfo {
                id: Uuid::new_v4(),
                origin: "in-process".to_string(),
                addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            },
            outbound,
            finished,
        });
        rx
    }

    /// Clear the slot if it still belongs to `id`.
    fn release(&self, id: Uuid) {
        let mut active = self.shared.active.lock();
        if active.as_ref().is_some_and(|p| p.info.id == id) {
            *active = None;
            self.shared.connected.send_replace(false);
        }
    }

    async fn serve_peer(&self, info: PeerInfo, socket: WebSocket) -> Result<(), ConnectionError> {
        let (mut sink, mut stream) = socket.split();
        let (outbound, mut rx) = mpsc::unbounded_channel::<String>();
        let (_finished_tx, finished) = oneshot::channel();

        self.attach(Peer {
            info: info.clone(),
            outbound,
            finished,
        });

        let writer = async {
            while let Some(text) = rx.recv().await {
                sink.send(Message::Text(text.into()))
                    .await
                    .map_err(ConnectionError::Send)?;
            }
            // Outbound side closed: superseded or shutting down
            let _ = sink.send(Message::Close(None)).await;
            Ok::<(), ConnectionError>(())
        };

        let reader = async {
            while let Some(frame) = stream.next().await {
                match frame.map_err(ConnectionError::Receive)? {
                    Message::Close(_) => break,
                    Message::Text(text) => {
                        debug!("ignoring message from {}: {}", info, text.as_str())
                    }
                    _ => {}
                }
            }
            Ok::<(), ConnectionError>(())
        };

        tokio::select! {
            result = writer => result,
            result = reader => result,
        }
    }
}

async fn ws_handler(
    State(connection): State<TimerConnection>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> impl axum::response::IntoResponse {
    let origin = headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| addr.to_string());

    ws.on_upgrade(move |socket| async move {
        let info = PeerInfo {
            id: Uuid::new_v4(),
            origin,
            addr,
        };
        info!("[connect] {}", info);

        if let Err(err) = connection.serve_peer(info.clone(), socket).await {
            error!("timer session {} ended with error: {}", info.id, err);
        }

        connection.release(info.id);
        info!("[disconnect] {}", info);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_without_peer_is_dropped() {
        let connection = TimerConnection::new();
        assert!(!connection.connected());
        connection.send("start", true);
        connection.send("setgametime 1.0", false);
        assert!(!connection.connected());
        assert!(connection.peer().is_none());
    }

    #[test]
    fn test_drops_warn_once_per_disconnected_period() {
        let connection = TimerConnection::new();
        let logs = crate::logging::capture(|| {
            for _ in 0..5 {
                connection.send("split", true);
            }
        });

        let warnings: Vec<&str> = logs.lines().filter(|l| l.contains("WARN")).collect();
        assert_eq!(warnings.len(), 1, "logs: {}", logs);
        assert!(warnings[0].contains("no timer connected"));
        assert_eq!(logs.lines().filter(|l| l.contains("DEBUG")).count(), 4);
        assert!(!logs.contains("[send]"));

        // A new peer starts a fresh period
        let mut rx = connection.attach_channel();
        connection.send("start", false);
        assert_eq!(rx.try_recv().unwrap(), "start");
        drop(rx);
        let logs = crate::logging::capture(|| connection.send("split", true));
        assert!(logs.contains("lost while sending"), "logs: {}", logs);
        assert!(!connection.connected());

        let logs = crate::logging::capture(|| connection.send("split", true));
        assert_eq!(logs.lines().filter(|l| l.contains("WARN")).count(), 1);
        assert!(logs.contains("dropping commands until one attaches"));
    }

    #[tokio::test]
    async fn test_listen_on_ephemeral_port() {
        let connection = TimerConnection::listen("127.0.0.1", 0).await.unwrap();
        let addr = connection.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
        assert!(!connection.connected());
        connection.shutdown().await;
    }

    #[tokio::test]
    async fn test_bind_conflict_is_reported() {
        let first = TimerConnection::listen("127.0.0.1", 0).await.unwrap();
        let port = first.local_addr().unwrap().port();

        let err = TimerConnection::listen("127.0.0.1", port).await.err().unwrap();
        assert!(matches!(err, RelayError::Bind { .. }));
        first.shutdown().await;
    }
}
