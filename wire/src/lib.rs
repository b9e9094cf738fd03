//! Packet model and text codec for the realtime socket transport.
//!
//! The platform pushes test progress over socket.io (protocol v5) running on
//! engine.io (protocol v4) with the websocket transport only. Two layers are
//! stacked inside each websocket text message:
//!
//! ```text
//! engine.io   <type digit><payload>          e.g. "4" + socket packet
//! socket.io   <type digit>[/ns,][ack id][json]  e.g. 42["test-result",{...}]
//! ```
//!
//! This crate owns both encodings plus the fixed event vocabulary, so the
//! client never builds packet strings by hand. Payloads stay as
//! `serde_json::Value`; typing them is the caller's concern.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// EVENT VOCABULARY
// =============================================================================

/// Inbound: a test result was recorded.
pub const TEST_RESULT: &str = "test-result";

/// Inbound: an execution task changed status.
pub const TASK_STATUS: &str = "task-status";

/// Outbound: start receiving results for one task.
pub const SUBSCRIBE_TO_RESULTS: &str = "subscribe-to-results";

/// Outbound: stop receiving results for one task.
pub const UNSUBSCRIBE_FROM_RESULTS: &str = "unsubscribe-from-results";

/// Namespace used when a packet carries none on the wire.
pub const DEFAULT_NAMESPACE: &str = "/";

/// Payload of the subscribe/unsubscribe events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSubscription {
    pub task_id: i64,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Error returned by [`decode_engine`] and [`decode_socket`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text message carried no packet type.
    #[error("empty packet")]
    Empty,
    /// The leading type digit is not defined for the layer.
    #[error("unknown {layer} packet type: {found:?}")]
    UnknownType { layer: &'static str, found: char },
    /// A JSON section of the packet failed to parse.
    #[error("invalid packet json: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// An ack packet arrived without its numeric id.
    #[error("ack packet without id")]
    MissingAckId,
    /// An event payload was not a `[name, ...args]` array.
    #[error("malformed event payload: {0}")]
    MalformedEvent(String),
    /// Binary attachments are not used by this platform.
    #[error("binary socket packets are not supported")]
    BinaryUnsupported,
}

// =============================================================================
// ENGINE.IO
// =============================================================================

/// Session parameters sent by the server in the engine.io open packet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Milliseconds between server pings.
    pub ping_interval: u64,
    /// Milliseconds the server waits for a pong.
    pub ping_timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_payload: Option<u64>,
}

impl Handshake {
    /// Longest silence tolerated before the connection counts as lost.
    #[must_use]
    pub fn heartbeat_deadline(&self) -> Duration {
        Duration::from_millis(self.ping_interval.saturating_add(self.ping_timeout))
    }
}

/// A single engine.io packet.
#[derive(Clone, Debug, PartialEq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping(Option<String>),
    Pong(Option<String>),
    /// Carries an encoded socket.io packet.
    Message(String),
    Upgrade,
    Noop,
}

/// Encode an engine.io packet into websocket text.
#[must_use]
pub fn encode_engine(packet: &EnginePacket) -> String {
    match packet {
        EnginePacket::Open(handshake) => {
            // Serializing a plain struct of strings and integers cannot fail.
            let json = serde_json::to_string(handshake).unwrap_or_default();
            format!("0{json}")
        }
        EnginePacket::Close => "1".to_owned(),
        EnginePacket::Ping(payload) => format!("2{}", payload.as_deref().unwrap_or_default()),
        EnginePacket::Pong(payload) => format!("3{}", payload.as_deref().unwrap_or_default()),
        EnginePacket::Message(body) => format!("4{body}"),
        EnginePacket::Upgrade => "5".to_owned(),
        EnginePacket::Noop => "6".to_owned(),
    }
}

/// Decode websocket text into an engine.io packet.
///
/// # Errors
///
/// Returns [`CodecError::Empty`] for empty text, [`CodecError::UnknownType`]
/// for an undefined type digit, and [`CodecError::InvalidJson`] when the open
/// handshake is malformed.
pub fn decode_engine(text: &str) -> Result<EnginePacket, CodecError> {
    let (kind, rest) = split_type(text)?;
    match kind {
        '0' => Ok(EnginePacket::Open(serde_json::from_str(rest)?)),
        '1' => Ok(EnginePacket::Close),
        '2' => Ok(EnginePacket::Ping(non_empty(rest))),
        '3' => Ok(EnginePacket::Pong(non_empty(rest))),
        '4' => Ok(EnginePacket::Message(rest.to_owned())),
        '5' => Ok(EnginePacket::Upgrade),
        '6' => Ok(EnginePacket::Noop),
        other => Err(CodecError::UnknownType { layer: "engine.io", found: other }),
    }
}

// =============================================================================
// SOCKET.IO
// =============================================================================

/// A single socket.io packet, carried inside [`EnginePacket::Message`].
#[derive(Clone, Debug, PartialEq)]
pub enum SocketPacket {
    Connect { namespace: String, data: Option<Value> },
    Disconnect { namespace: String },
    Event { namespace: String, ack_id: Option<u64>, name: String, args: Vec<Value> },
    Ack { namespace: String, ack_id: u64, args: Vec<Value> },
    ConnectError { namespace: String, data: Option<Value> },
}

impl SocketPacket {
    /// Namespace connect request for the default namespace.
    #[must_use]
    pub fn connect() -> Self {
        Self::Connect { namespace: DEFAULT_NAMESPACE.to_owned(), data: None }
    }

    /// Namespace disconnect for the default namespace.
    #[must_use]
    pub fn disconnect() -> Self {
        Self::Disconnect { namespace: DEFAULT_NAMESPACE.to_owned() }
    }

    /// Fire-and-forget event with a single argument on the default namespace.
    #[must_use]
    pub fn event(name: &str, arg: Value) -> Self {
        Self::Event { namespace: DEFAULT_NAMESPACE.to_owned(), ack_id: None, name: name.to_owned(), args: vec![arg] }
    }

    /// Namespace this packet belongs to.
    #[must_use]
    pub fn namespace(&self) -> &str {
        match self {
            Self::Connect { namespace, .. }
            | Self::Disconnect { namespace }
            | Self::Event { namespace, .. }
            | Self::Ack { namespace, .. }
            | Self::ConnectError { namespace, .. } => namespace,
        }
    }
}

/// Build the subscribe event for a task's results.
#[must_use]
pub fn subscribe_to_results(task_id: i64) -> SocketPacket {
    SocketPacket::event(SUBSCRIBE_TO_RESULTS, subscription_value(task_id))
}

/// Build the unsubscribe event for a task's results.
#[must_use]
pub fn unsubscribe_from_results(task_id: i64) -> SocketPacket {
    SocketPacket::event(UNSUBSCRIBE_FROM_RESULTS, subscription_value(task_id))
}

fn subscription_value(task_id: i64) -> Value {
    serde_json::json!({ "taskId": task_id })
}

/// Encode a socket.io packet (without the engine.io prefix).
#[must_use]
pub fn encode_socket(packet: &SocketPacket) -> String {
    let (kind, namespace, ack_id, payload) = match packet {
        SocketPacket::Connect { namespace, data } => ('0', namespace, None, data.clone()),
        SocketPacket::Disconnect { namespace } => ('1', namespace, None, None),
        SocketPacket::Event { namespace, ack_id, name, args } => {
            let mut items = Vec::with_capacity(args.len() + 1);
            items.push(Value::String(name.clone()));
            items.extend(args.iter().cloned());
            ('2', namespace, *ack_id, Some(Value::Array(items)))
        }
        SocketPacket::Ack { namespace, ack_id, args } => ('3', namespace, Some(*ack_id), Some(Value::Array(args.clone()))),
        SocketPacket::ConnectError { namespace, data } => ('4', namespace, None, data.clone()),
    };

    let mut out = String::new();
    out.push(kind);
    if namespace != DEFAULT_NAMESPACE && !namespace.is_empty() {
        out.push_str(namespace);
        out.push(',');
    }
    if let Some(id) = ack_id {
        out.push_str(&id.to_string());
    }
    if let Some(payload) = payload {
        out.push_str(&payload.to_string());
    }
    out
}

/// Encode a socket.io packet wrapped in an engine.io message, ready to send.
#[must_use]
pub fn encode_message(packet: &SocketPacket) -> String {
    encode_engine(&EnginePacket::Message(encode_socket(packet)))
}

/// Decode a socket.io packet (the body of an engine.io message).
///
/// # Errors
///
/// Returns [`CodecError`] for empty input, unknown or binary packet types,
/// malformed JSON, ack packets without an id, and events whose payload is not
/// a `[name, ...args]` array.
pub fn decode_socket(text: &str) -> Result<SocketPacket, CodecError> {
    let (kind, rest) = split_type(text)?;
    if matches!(kind, '5' | '6') {
        return Err(CodecError::BinaryUnsupported);
    }
    if !matches!(kind, '0'..='4') {
        return Err(CodecError::UnknownType { layer: "socket.io", found: kind });
    }

    let (namespace, rest) = split_namespace(rest);
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    let ack_id = if digits > 0 { rest[..digits].parse::<u64>().ok() } else { None };
    let body = &rest[digits..];
    let payload = if body.is_empty() { None } else { Some(serde_json::from_str::<Value>(body)?) };

    match kind {
        '0' => Ok(SocketPacket::Connect { namespace, data: payload }),
        '1' => Ok(SocketPacket::Disconnect { namespace }),
        '2' => {
            let (name, args) = split_event(payload)?;
            Ok(SocketPacket::Event { namespace, ack_id, name, args })
        }
        '3' => {
            let ack_id = ack_id.ok_or(CodecError::MissingAckId)?;
            let args = match payload {
                Some(Value::Array(items)) => items,
                Some(other) => vec![other],
                None => Vec::new(),
            };
            Ok(SocketPacket::Ack { namespace, ack_id, args })
        }
        _ => Ok(SocketPacket::ConnectError { namespace, data: payload }),
    }
}

fn split_type(text: &str) -> Result<(char, &str), CodecError> {
    let mut chars = text.chars();
    let kind = chars.next().ok_or(CodecError::Empty)?;
    Ok((kind, chars.as_str()))
}

fn non_empty(rest: &str) -> Option<String> {
    if rest.is_empty() { None } else { Some(rest.to_owned()) }
}

fn split_namespace(rest: &str) -> (String, &str) {
    if !rest.starts_with('/') {
        return (DEFAULT_NAMESPACE.to_owned(), rest);
    }
    match rest.find(',') {
        Some(idx) => (rest[..idx].to_owned(), &rest[idx + 1..]),
        None => (rest.to_owned(), ""),
    }
}

fn split_event(payload: Option<Value>) -> Result<(String, Vec<Value>), CodecError> {
    let Some(Value::Array(mut items)) = payload else {
        return Err(CodecError::MalformedEvent("expected a JSON array".to_owned()));
    };
    if items.is_empty() {
        return Err(CodecError::MalformedEvent("missing event name".to_owned()));
    }
    let Value::String(name) = items.remove(0) else {
        return Err(CodecError::MalformedEvent("event name is not a string".to_owned()));
    };
    Ok((name, items))
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
