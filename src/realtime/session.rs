//! One realtime session: handshake, heartbeat, event pump, reconnect.
//!
//! DESIGN
//! ======
//! [`open`] performs the engine.io open handshake and the socket.io
//! namespace connect, then hands the live stream to [`run`], which owns it
//! for the rest of the session. `run` is a `select!` loop over the socket,
//! the caller's command channel, and a heartbeat deadline that moves
//! forward on every packet received.
//!
//! A lost connection is re-opened with exponential backoff when enabled;
//! active task subscriptions are re-emitted once the namespace is connected
//! again. A namespace disconnect sent by the server ends the session
//! without reconnecting.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep, sleep_until, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use wire::{EnginePacket, Handshake, SocketPacket};

use super::hub::EventHub;
use super::{ConnectionStatus, SocketEvent};
use crate::error::RealtimeError;

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Request from the client handle to the session task.
#[derive(Debug)]
pub(crate) enum Command {
    Emit(SocketPacket),
    Close,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Backoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Backoff {
    fn next(self, delay: Duration) -> Duration {
        delay.saturating_mul(2).min(self.max)
    }
}

/// State shared between the client handle and its session task.
#[derive(Clone)]
pub(crate) struct Shared {
    pub url: String,
    pub connect_timeout: Duration,
    pub reconnect: bool,
    pub backoff: Backoff,
    pub hub: EventHub,
    pub status: Arc<watch::Sender<ConnectionStatus>>,
    pub subscriptions: Arc<Mutex<BTreeSet<i64>>>,
}

impl Shared {
    fn set_status(&self, status: ConnectionStatus) {
        self.status.send_replace(status);
    }

    fn subscribed_tasks(&self) -> Vec<i64> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect()
    }
}

/// Why the pump loop stopped.
enum Exit {
    /// The caller asked to disconnect, or dropped the client.
    Requested,
    /// The server disconnected the namespace on purpose.
    ServerDisconnect,
    Lost(String),
}

// =============================================================================
// HANDSHAKE
// =============================================================================

/// Open the websocket and complete both handshakes within `limit`.
pub(crate) async fn open(url: &str, limit: Duration) -> Result<(WsStream, Handshake), RealtimeError> {
    timeout(limit, handshake(url)).await.map_err(|_| RealtimeError::Timeout)?
}

async fn handshake(url: &str) -> Result<(WsStream, Handshake), RealtimeError> {
    let (mut stream, _) = connect_async(url).await?;

    let open = match wire::decode_engine(&next_text(&mut stream).await?)? {
        EnginePacket::Open(open) => open,
        other => return Err(RealtimeError::Handshake(format!("{other:?}"))),
    };
    debug!(sid = %open.sid, ping_interval = open.ping_interval, "engine.io open");

    send_socket(&mut stream, &SocketPacket::connect()).await?;

    loop {
        match wire::decode_engine(&next_text(&mut stream).await?)? {
            EnginePacket::Ping(payload) => send_engine(&mut stream, &EnginePacket::Pong(payload)).await?,
            EnginePacket::Noop => {}
            EnginePacket::Close => return Err(RealtimeError::Closed),
            EnginePacket::Message(body) => match wire::decode_socket(&body)? {
                SocketPacket::Connect { .. } => return Ok((stream, open)),
                SocketPacket::ConnectError { data, .. } => {
                    return Err(RealtimeError::ConnectRejected(connect_error_message(data.as_ref())));
                }
                other => debug!(?other, "packet before namespace connect ignored"),
            },
            other => return Err(RealtimeError::Handshake(format!("{other:?}"))),
        }
    }
}

fn connect_error_message(data: Option<&serde_json::Value>) -> String {
    match data {
        Some(serde_json::Value::Object(map)) => map
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map_or_else(|| serde_json::Value::Object(map.clone()).to_string(), str::to_owned),
        Some(serde_json::Value::String(message)) => message.clone(),
        Some(other) => other.to_string(),
        None => "no reason given".to_owned(),
    }
}

async fn next_text(stream: &mut WsStream) -> Result<String, RealtimeError> {
    loop {
        let Some(message) = stream.next().await else {
            return Err(RealtimeError::Closed);
        };
        match message? {
            Message::Text(text) => return Ok(text.as_str().to_owned()),
            Message::Close(_) => return Err(RealtimeError::Closed),
            _ => {}
        }
    }
}

async fn send_engine(stream: &mut WsStream, packet: &EnginePacket) -> Result<(), RealtimeError> {
    stream.send(Message::Text(wire::encode_engine(packet).into())).await?;
    Ok(())
}

async fn send_socket(stream: &mut WsStream, packet: &SocketPacket) -> Result<(), RealtimeError> {
    stream.send(Message::Text(wire::encode_message(packet).into())).await?;
    Ok(())
}

// =============================================================================
// SESSION LOOP
// =============================================================================

/// Drive the session until the caller disconnects or the connection is
/// lost for good. Leaves the status at `Disconnected`.
pub(crate) async fn run(
    shared: Shared,
    mut stream: WsStream,
    mut open: Handshake,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    loop {
        match pump(&shared, &mut stream, &open, &mut commands).await {
            Exit::Requested => {
                let _ = send_socket(&mut stream, &SocketPacket::disconnect()).await;
                let _ = stream.close(None).await;
                break;
            }
            Exit::ServerDisconnect => {
                let _ = stream.close(None).await;
                break;
            }
            Exit::Lost(reason) => {
                warn!(%reason, "realtime connection lost");
                if !shared.reconnect {
                    break;
                }
                shared.set_status(ConnectionStatus::Connecting);
                let Some((next_stream, next_open)) = reconnect(&shared, &mut commands).await else {
                    break;
                };
                stream = next_stream;
                open = next_open;
                let mut replayed = true;
                for task_id in shared.subscribed_tasks() {
                    if send_socket(&mut stream, &wire::subscribe_to_results(task_id)).await.is_err() {
                        replayed = false;
                        break;
                    }
                }
                if replayed {
                    shared.set_status(ConnectionStatus::Connected);
                    info!(url = %shared.url, "realtime reconnected");
                }
            }
        }
    }
    shared.set_status(ConnectionStatus::Disconnected);
    info!(url = %shared.url, "realtime disconnected");
}

async fn pump(
    shared: &Shared,
    stream: &mut WsStream,
    open: &Handshake,
    commands: &mut mpsc::UnboundedReceiver<Command>,
) -> Exit {
    let deadline = open.heartbeat_deadline();
    let mut last_seen = Instant::now();

    loop {
        tokio::select! {
            message = stream.next() => {
                last_seen = Instant::now();
                let message = match message {
                    None => return Exit::Lost("socket closed".to_owned()),
                    Some(Err(error)) => return Exit::Lost(error.to_string()),
                    Some(Ok(message)) => message,
                };
                match message {
                    Message::Text(text) => {
                        if let Some(exit) = handle_text(shared, stream, text.as_str()).await {
                            return exit;
                        }
                    }
                    Message::Close(_) => return Exit::Lost("server closed socket".to_owned()),
                    _ => {}
                }
            }
            command = commands.recv() => match command {
                Some(Command::Emit(packet)) => {
                    if let Err(error) = send_socket(stream, &packet).await {
                        return Exit::Lost(error.to_string());
                    }
                }
                Some(Command::Close) | None => return Exit::Requested,
            },
            () = sleep_until(last_seen + deadline) => {
                return Exit::Lost(format!("no packet within {deadline:?}"));
            }
        }
    }
}

async fn handle_text(shared: &Shared, stream: &mut WsStream, text: &str) -> Option<Exit> {
    let packet = match wire::decode_engine(text) {
        Ok(packet) => packet,
        Err(error) => {
            debug!(%error, "undecodable engine.io packet dropped");
            return None;
        }
    };
    match packet {
        EnginePacket::Ping(payload) => {
            if let Err(error) = send_engine(stream, &EnginePacket::Pong(payload)).await {
                return Some(Exit::Lost(error.to_string()));
            }
        }
        EnginePacket::Close => return Some(Exit::Lost("server closed session".to_owned())),
        EnginePacket::Message(body) => return handle_socket(shared, &body),
        _ => {}
    }
    None
}

fn handle_socket(shared: &Shared, body: &str) -> Option<Exit> {
    let packet = match wire::decode_socket(body) {
        Ok(packet) => packet,
        Err(error) => {
            debug!(%error, "undecodable socket.io packet dropped");
            return None;
        }
    };
    match packet {
        SocketPacket::Event { namespace, name, args, .. } if namespace == wire::DEFAULT_NAMESPACE => {
            let Some(event) = SocketEvent::from_name(&name) else {
                debug!(event = %name, "unhandled server event ignored");
                return None;
            };
            let data = args.into_iter().next().unwrap_or(serde_json::Value::Null);
            let listeners = shared.hub.dispatch(event, &data);
            debug!(event = %name, listeners, "server event dispatched");
        }
        SocketPacket::Disconnect { .. } => return Some(Exit::ServerDisconnect),
        other => debug!(namespace = other.namespace(), "socket.io packet ignored"),
    }
    None
}

// =============================================================================
// RECONNECT
// =============================================================================

/// Retry [`open`] with exponential backoff until it succeeds or the caller
/// closes the session. Returns `None` in the latter case.
async fn reconnect(
    shared: &Shared,
    commands: &mut mpsc::UnboundedReceiver<Command>,
) -> Option<(WsStream, Handshake)> {
    let mut delay = shared.backoff.initial;
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Close) | None => return None,
                Some(Command::Emit(packet)) => {
                    debug!(?packet, "emit while reconnecting dropped");
                    continue;
                }
            },
            () = sleep(delay) => {}
        }

        attempt += 1;
        match open(&shared.url, shared.connect_timeout).await {
            Ok(session) => return Some(session),
            Err(error) => {
                warn!(%error, attempt, retry_in = ?shared.backoff.next(delay), "realtime reconnect failed");
                delay = shared.backoff.next(delay);
            }
        }
    }
}
