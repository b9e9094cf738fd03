//! Realtime task results over socket.io.
//!
//! SYSTEM CONTEXT
//! ==============
//! The platform pushes `test-result` and `task-status` events to clients
//! that subscribed to a task. [`RealtimeClient`] owns one socket session and
//! an [`EventHub`] of listeners; the session task forwards those two events
//! into the hub and ignores every other event.
//!
//! The client is a plain value. Create as many as needed; dropping one
//! closes its session.

mod hub;
mod session;

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use reqwest::Url;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::ClientConfig;
use crate::error::RealtimeError;
use session::{Backoff, Command, Shared};

pub use hub::{EventHub, Listener, ListenerId};

/// Query string selecting engine.io v4 over the websocket transport.
pub const TRANSPORT_QUERY: &str = "EIO=4&transport=websocket";

pub const RECONNECT_INITIAL_DELAY: Duration = Duration::from_secs(1);
pub const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(30);

const DISCONNECT_GRACE: Duration = Duration::from_secs(5);

// =============================================================================
// EVENTS AND STATUS
// =============================================================================

/// Server events forwarded to listeners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SocketEvent {
    /// A script result was recorded for a subscribed task.
    TestResult,
    /// A subscribed task changed status.
    TaskStatus,
}

impl SocketEvent {
    pub const ALL: [Self; 2] = [Self::TestResult, Self::TaskStatus];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TestResult => wire::TEST_RESULT,
            Self::TaskStatus => wire::TASK_STATUS,
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.as_str() == name)
    }
}

impl std::fmt::Display for SocketEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Websocket URL for the socket server at `origin` mounted on `path`.
///
/// # Errors
///
/// Returns [`RealtimeError::InvalidUrl`] unless `origin` is an absolute
/// `http`, `https`, `ws` or `wss` URL.
pub fn socket_url(origin: &str, path: &str) -> Result<String, RealtimeError> {
    let mut url = Url::parse(origin).map_err(|e| RealtimeError::InvalidUrl(format!("{origin}: {e}")))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(RealtimeError::InvalidUrl(format!("{origin}: unsupported scheme {other}"))),
    };
    url.set_scheme(scheme)
        .map_err(|()| RealtimeError::InvalidUrl(origin.to_owned()))?;
    let base = url.path().trim_end_matches('/').to_owned();
    let mount = path.trim_matches('/');
    if mount.is_empty() {
        url.set_path(&format!("{base}/"));
    } else {
        url.set_path(&format!("{base}/{mount}/"));
    }
    url.set_query(Some(TRANSPORT_QUERY));
    Ok(url.to_string())
}

// =============================================================================
// CLIENT
// =============================================================================

/// Puts the status back to `Disconnected` unless the attempt finished,
/// including when the `connect()` future is dropped mid-handshake.
struct ConnectAttempt<'a> {
    status: &'a watch::Sender<ConnectionStatus>,
    done: bool,
}

impl Drop for ConnectAttempt<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.status.send_replace(ConnectionStatus::Disconnected);
        }
    }
}

struct Connection {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

/// Socket session plus its listener registry.
pub struct RealtimeClient {
    shared: Shared,
    connection: Mutex<Option<Connection>>,
}

impl std::fmt::Debug for RealtimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeClient")
            .field("url", &self.shared.url)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl RealtimeClient {
    /// # Errors
    ///
    /// Returns [`RealtimeError::InvalidUrl`] for an unusable socket origin.
    pub fn new(config: &ClientConfig) -> Result<Self, RealtimeError> {
        let url = socket_url(&config.socket_url, &config.socket_path)?;
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);
        Ok(Self {
            shared: Shared {
                url,
                connect_timeout: config.timeouts.connect(),
                reconnect: config.reconnect,
                backoff: Backoff { initial: RECONNECT_INITIAL_DELAY, max: RECONNECT_MAX_DELAY },
                hub: EventHub::new(),
                status: Arc::new(status),
                subscriptions: Arc::new(Mutex::new(BTreeSet::new())),
            },
            connection: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.shared.url
    }

    #[must_use]
    pub fn hub(&self) -> &EventHub {
        &self.shared.hub
    }

    /// Register a listener; see [`EventHub::on`].
    pub fn on<F>(&self, event: SocketEvent, listener: F) -> ListenerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.shared.hub.on(event, listener)
    }

    /// Remove a listener; see [`EventHub::off`].
    pub fn off(&self, event: SocketEvent, id: ListenerId) -> bool {
        self.shared.hub.off(event, id)
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        *self.shared.status.borrow()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    /// Receiver that observes every status transition.
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status.subscribe()
    }

    /// Task ids whose results this client subscribed to.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<i64> {
        self.subscription_set().iter().copied().collect()
    }

    fn subscription_set(&self) -> std::sync::MutexGuard<'_, BTreeSet<i64>> {
        self.shared.subscriptions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn connection(&self) -> std::sync::MutexGuard<'_, Option<Connection>> {
        self.connection.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open the socket and connect the default namespace. Dropping the
    /// future before it completes leaves the client `Disconnected`.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::AlreadyConnected`] while a session is
    /// connecting or connected, and the handshake error otherwise.
    pub async fn connect(&self) -> Result<(), RealtimeError> {
        let mut claimed = false;
        self.shared.status.send_if_modified(|status| {
            if *status == ConnectionStatus::Disconnected {
                *status = ConnectionStatus::Connecting;
                claimed = true;
                true
            } else {
                false
            }
        });
        if !claimed {
            return Err(RealtimeError::AlreadyConnected);
        }

        let mut attempt = ConnectAttempt { status: &self.shared.status, done: false };
        let (stream, open) = session::open(&self.shared.url, self.shared.connect_timeout).await?;

        self.subscription_set().clear();
        self.shared.status.send_replace(ConnectionStatus::Connected);
        attempt.done = true;
        let (commands, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(session::run(self.shared.clone(), stream, open, rx));
        if let Some(stale) = self.connection().replace(Connection { commands, task }) {
            stale.task.abort();
        }
        info!(url = %self.shared.url, "realtime connected");
        Ok(())
    }

    /// Close the session. A no-op when nothing is connected.
    pub async fn disconnect(&self) {
        let Some(connection) = self.connection().take() else {
            return;
        };
        let _ = connection.commands.send(Command::Close);
        let mut task = connection.task;
        if tokio::time::timeout(DISCONNECT_GRACE, &mut task).await.is_err() {
            task.abort();
        }
        self.subscription_set().clear();
        self.shared.status.send_replace(ConnectionStatus::Disconnected);
    }

    /// Ask the server for `task_id`'s results. Returns `false` without
    /// sending anything unless connected.
    pub fn subscribe_to_task_results(&self, task_id: i64) -> bool {
        if !self.emit(wire::subscribe_to_results(task_id)) {
            return false;
        }
        self.subscription_set().insert(task_id);
        true
    }

    /// Stop receiving `task_id`'s results. Returns `false` without sending
    /// anything unless connected.
    pub fn unsubscribe_from_task_results(&self, task_id: i64) -> bool {
        if !self.emit(wire::unsubscribe_from_results(task_id)) {
            return false;
        }
        self.subscription_set().remove(&task_id);
        true
    }

    fn emit(&self, packet: wire::SocketPacket) -> bool {
        if !self.is_connected() {
            return false;
        }
        self.connection()
            .as_ref()
            .is_some_and(|connection| connection.commands.send(Command::Emit(packet)).is_ok())
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;
