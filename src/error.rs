//! Error types surfaced to SDK callers.

/// Failure of a single REST call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The configured base URL cannot be combined with an endpoint path.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    /// Transport-level failure reported by the HTTP client.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status. `body` is the raw text.
    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// A success response did not match the expected payload shape.
    #[error("invalid JSON payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status of a rejected call, if the server answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Failure of the realtime socket.
#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    /// The socket origin is not an `http(s)`/`ws(s)` URL.
    #[error("invalid socket URL: {0}")]
    InvalidUrl(String),
    #[error("websocket connect failed: {0}")]
    WsConnect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("packet decode failed: {0}")]
    Codec(#[from] wire::CodecError),
    /// The server spoke out of protocol order during the handshake.
    #[error("unexpected handshake packet: {0}")]
    Handshake(String),
    /// The server refused the namespace connect.
    #[error("socket connect rejected: {0}")]
    ConnectRejected(String),
    #[error("websocket closed")]
    Closed,
    #[error("timed out waiting for socket handshake")]
    Timeout,
    /// `connect` was called while a connection is already running.
    #[error("socket already connected")]
    AlreadyConnected,
}

impl From<tokio_tungstenite::tungstenite::Error> for RealtimeError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WsConnect(Box::new(err))
    }
}
