use super::*;
use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::time::timeout;

/// Pushed through the mock's broadcast channel to drop every live socket
/// without a close frame.
const DROP: &str = "__drop__";

struct MockState {
    received: mpsc::UnboundedSender<String>,
    pushes: broadcast::Sender<String>,
    connections: AtomicUsize,
    reject: Option<&'static str>,
    ping_interval: u64,
    ping_timeout: u64,
}

struct MockServer {
    addr: std::net::SocketAddr,
    state: Arc<MockState>,
    received: mpsc::UnboundedReceiver<String>,
}

impl MockServer {
    async fn start() -> Self {
        Self::start_with(None, 25_000, 20_000).await
    }

    async fn start_with(reject: Option<&'static str>, ping_interval: u64, ping_timeout: u64) -> Self {
        let (received_tx, received) = mpsc::unbounded_channel();
        let (pushes, _) = broadcast::channel(64);
        let state = Arc::new(MockState {
            received: received_tx,
            pushes,
            connections: AtomicUsize::new(0),
            reject,
            ping_interval,
            ping_timeout,
        });
        let app = Router::new()
            .route("/ws/socket.io/", get(mock_upgrade))
            .with_state(Arc::clone(&state));
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock socket");
        let addr = listener.local_addr().expect("mock socket addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock socket serve");
        });
        Self { addr, state, received }
    }

    fn config(&self, reconnect: bool) -> ClientConfig {
        ClientConfig::default()
            .with_socket_url(&format!("http://{}", self.addr))
            .with_reconnect(reconnect)
    }

    fn client(&self, reconnect: bool) -> RealtimeClient {
        let mut client = RealtimeClient::new(&self.config(reconnect)).expect("realtime client");
        client.shared.backoff = Backoff { initial: Duration::from_millis(50), max: Duration::from_millis(200) };
        client
    }

    fn push(&self, text: &str) {
        self.state.pushes.send(text.to_owned()).expect("mock has a live socket");
    }

    async fn next_received(&mut self) -> String {
        timeout(Duration::from_secs(2), self.received.recv())
            .await
            .expect("mock receive timed out")
            .expect("mock receive channel closed")
    }

    async fn expect_received(&mut self, expected: &str) {
        loop {
            let text = self.next_received().await;
            if text == expected {
                return;
            }
            assert!(text == "3", "unexpected client packet {text}, wanted {expected}");
        }
    }
}

async fn mock_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<MockState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run_mock(socket, state))
}

async fn run_mock(mut socket: WebSocket, state: Arc<MockState>) {
    let n = state.connections.fetch_add(1, Ordering::SeqCst) + 1;
    let mut pushes = state.pushes.subscribe();
    let open = json!({
        "sid": format!("mock-{n}"),
        "upgrades": [],
        "pingInterval": state.ping_interval,
        "pingTimeout": state.ping_timeout,
        "maxPayload": 1_000_000
    });
    if socket.send(Message::Text(format!("0{open}").into())).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let text = text.as_str().to_owned();
                        let _ = state.received.send(text.clone());
                        if text == "40" {
                            let reply = match state.reject {
                                Some(message) => format!("44{}", json!({ "message": message })),
                                None => format!("40{}", json!({ "sid": format!("ns-{n}") })),
                            };
                            if socket.send(Message::Text(reply.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Ok(push) = pushes.recv() => {
                if push == DROP {
                    break;
                }
                if socket.send(Message::Text(push.into())).await.is_err() {
                    break;
                }
            }
        }
    }
}

async fn wait_for_status(client: &RealtimeClient, wanted: ConnectionStatus) {
    let mut rx = client.watch_status();
    timeout(Duration::from_secs(3), rx.wait_for(|status| *status == wanted))
        .await
        .expect("status wait timed out")
        .expect("status channel closed");
}

// =============================================================================
// URL AND EVENT NAMES
// =============================================================================

#[test]
fn socket_url_maps_http_origin_to_engine_io_websocket() {
    assert_eq!(
        socket_url("http://localhost:8080", "/ws/socket.io").expect("url"),
        "ws://localhost:8080/ws/socket.io/?EIO=4&transport=websocket"
    );
    assert_eq!(
        socket_url("https://qa.example.test/platform/", "ws/socket.io/").expect("url"),
        "wss://qa.example.test/platform/ws/socket.io/?EIO=4&transport=websocket"
    );
}

#[test]
fn socket_url_rejects_non_web_origins() {
    assert!(matches!(socket_url("ftp://host", "/ws"), Err(RealtimeError::InvalidUrl(_))));
    assert!(matches!(socket_url("localhost", "/ws"), Err(RealtimeError::InvalidUrl(_))));
}

#[test]
fn socket_event_names_match_server_events() {
    assert_eq!(SocketEvent::TestResult.as_str(), "test-result");
    assert_eq!(SocketEvent::TaskStatus.to_string(), "task-status");
    assert_eq!(SocketEvent::from_name("test-result"), Some(SocketEvent::TestResult));
    assert_eq!(SocketEvent::from_name("subscribe-to-results"), None);
}

// =============================================================================
// CONNECTION LIFECYCLE
// =============================================================================

#[tokio::test]
async fn connect_completes_namespace_handshake() {
    let mut server = MockServer::start().await;
    let client = server.client(false);
    assert_eq!(client.status(), ConnectionStatus::Disconnected);

    client.connect().await.expect("connect");

    server.expect_received("40").await;
    assert!(client.is_connected());
}

#[tokio::test]
async fn second_connect_is_rejected_while_connected() {
    let server = MockServer::start().await;
    let client = server.client(false);
    client.connect().await.expect("connect");

    assert!(matches!(client.connect().await, Err(RealtimeError::AlreadyConnected)));
}

#[tokio::test]
async fn connect_error_packet_is_surfaced() {
    let server = MockServer::start_with(Some("unauthorized"), 25_000, 20_000).await;
    let client = server.client(false);

    match client.connect().await {
        Err(RealtimeError::ConnectRejected(message)) => assert_eq!(message, "unauthorized"),
        other => panic!("expected connect rejection, got {other:?}"),
    }
    assert_eq!(client.status(), ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn connect_to_closed_port_fails_and_stays_disconnected() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let config = ClientConfig::default().with_socket_url(&format!("http://{addr}"));
    let client = RealtimeClient::new(&config).expect("client");

    assert!(client.connect().await.is_err());
    assert_eq!(client.status(), ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn cancelled_connect_releases_connecting_status() {
    // Accepts TCP but never answers the websocket upgrade.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    let mut config = ClientConfig::default().with_socket_url(&format!("http://{addr}"));
    config.timeouts.connect_secs = 1;
    let client = RealtimeClient::new(&config).expect("client");

    assert!(timeout(Duration::from_millis(200), client.connect()).await.is_err());
    assert_eq!(client.status(), ConnectionStatus::Disconnected);

    let retry = client.connect().await.expect_err("silent server");
    assert!(matches!(retry, RealtimeError::Timeout), "got {retry:?}");
    assert_eq!(client.status(), ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn disconnect_sends_namespace_disconnect_and_is_idempotent() {
    let mut server = MockServer::start().await;
    let client = server.client(false);
    client.connect().await.expect("connect");
    server.expect_received("40").await;

    client.disconnect().await;
    server.expect_received("41").await;
    assert_eq!(client.status(), ConnectionStatus::Disconnected);

    client.disconnect().await;
    assert!(!client.subscribe_to_task_results(1));
}

// =============================================================================
// SUBSCRIPTIONS AND EVENTS
// =============================================================================

#[tokio::test]
async fn subscribe_without_connection_sends_nothing() {
    let server = MockServer::start().await;
    let client = server.client(false);

    assert!(!client.subscribe_to_task_results(42));
    assert!(!client.unsubscribe_from_task_results(42));
    assert!(client.subscriptions().is_empty());
}

#[tokio::test]
async fn subscribe_and_unsubscribe_emit_task_payload() {
    let mut server = MockServer::start().await;
    let client = server.client(false);
    client.connect().await.expect("connect");
    server.expect_received("40").await;

    assert!(client.subscribe_to_task_results(42));
    server
        .expect_received(r#"42["subscribe-to-results",{"taskId":42}]"#)
        .await;
    assert_eq!(client.subscriptions(), vec![42]);

    assert!(client.unsubscribe_from_task_results(42));
    server
        .expect_received(r#"42["unsubscribe-from-results",{"taskId":42}]"#)
        .await;
    assert!(client.subscriptions().is_empty());
}

#[tokio::test]
async fn server_events_reach_matching_listeners_only() {
    let mut server = MockServer::start().await;
    let client = server.client(false);
    let (results_tx, mut results) = mpsc::unbounded_channel();
    let (status_tx, mut statuses) = mpsc::unbounded_channel();
    client.on(SocketEvent::TestResult, move |data| {
        let _ = results_tx.send(data.clone());
    });
    client.on(SocketEvent::TaskStatus, move |data| {
        let _ = status_tx.send(data.clone());
    });
    client.connect().await.expect("connect");
    server.expect_received("40").await;

    server.push(r#"42["other-event",{"ignored":true}]"#);
    server.push(r#"42["test-result",{"id":5,"status":"PASSED"}]"#);
    server.push(r#"42["task-status",{"taskId":1,"status":"COMPLETED"}]"#);

    let result = timeout(Duration::from_secs(2), results.recv()).await.expect("result").expect("open");
    assert_eq!(result, json!({"id": 5, "status": "PASSED"}));
    let status = timeout(Duration::from_secs(2), statuses.recv()).await.expect("status").expect("open");
    assert_eq!(status, json!({"taskId": 1, "status": "COMPLETED"}));
    assert!(results.try_recv().is_err());
}

#[tokio::test]
async fn removed_listener_no_longer_receives_events() {
    let mut server = MockServer::start().await;
    let client = server.client(false);
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let id = client.on(SocketEvent::TestResult, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let (seen_tx, mut seen) = mpsc::unbounded_channel();
    client.on(SocketEvent::TestResult, move |_| {
        let _ = seen_tx.send(());
    });
    client.connect().await.expect("connect");
    server.expect_received("40").await;

    assert!(client.off(SocketEvent::TestResult, id));
    server.push(r#"42["test-result",{"id":1}]"#);

    timeout(Duration::from_secs(2), seen.recv()).await.expect("event").expect("open");
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn server_ping_is_answered_with_pong() {
    let mut server = MockServer::start().await;
    let client = server.client(false);
    client.connect().await.expect("connect");
    server.expect_received("40").await;

    server.push("2");
    assert_eq!(server.next_received().await, "3");
}

// =============================================================================
// LOSS AND RECONNECT
// =============================================================================

#[tokio::test]
async fn dropped_socket_without_reconnect_ends_disconnected() {
    let mut server = MockServer::start().await;
    let client = server.client(false);
    client.connect().await.expect("connect");
    server.expect_received("40").await;

    server.push(DROP);

    wait_for_status(&client, ConnectionStatus::Disconnected).await;
    assert!(!client.subscribe_to_task_results(3));
}

#[tokio::test]
async fn missing_heartbeat_counts_as_lost_connection() {
    let mut server = MockServer::start_with(None, 100, 100).await;
    let client = server.client(false);
    client.connect().await.expect("connect");
    server.expect_received("40").await;

    wait_for_status(&client, ConnectionStatus::Disconnected).await;
}

#[tokio::test]
async fn reconnect_replays_active_subscriptions() {
    let mut server = MockServer::start().await;
    let client = server.client(true);
    client.connect().await.expect("connect");
    server.expect_received("40").await;
    assert!(client.subscribe_to_task_results(7));
    server
        .expect_received(r#"42["subscribe-to-results",{"taskId":7}]"#)
        .await;

    server.push(DROP);

    server.expect_received("40").await;
    server
        .expect_received(r#"42["subscribe-to-results",{"taskId":7}]"#)
        .await;
    wait_for_status(&client, ConnectionStatus::Connected).await;
    assert_eq!(server.state.connections.load(Ordering::SeqCst), 2);
    assert_eq!(client.subscriptions(), vec![7]);

    client.disconnect().await;
    server.expect_received("41").await;
}
