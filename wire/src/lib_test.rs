use super::*;
use serde_json::json;

fn sample_handshake() -> Handshake {
    Handshake {
        sid: "lv_VI97HAXpY6yYWAAAC".to_owned(),
        upgrades: Vec::new(),
        ping_interval: 25_000,
        ping_timeout: 20_000,
        max_payload: Some(1_000_000),
    }
}

#[test]
fn decode_engine_open_reads_handshake() {
    let text = r#"0{"sid":"lv_VI97HAXpY6yYWAAAC","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;
    let packet = decode_engine(text).expect("open packet");
    assert_eq!(packet, EnginePacket::Open(sample_handshake()));
}

#[test]
fn encode_engine_open_is_readable_by_decoder() {
    let text = encode_engine(&EnginePacket::Open(sample_handshake()));
    assert!(text.starts_with("0{"));
    assert_eq!(decode_engine(&text).expect("open"), EnginePacket::Open(sample_handshake()));
}

#[test]
fn handshake_deadline_sums_interval_and_timeout() {
    assert_eq!(sample_handshake().heartbeat_deadline(), Duration::from_millis(45_000));
}

#[test]
fn decode_engine_open_rejects_bad_json() {
    let err = decode_engine("0{not json").expect_err("should fail");
    assert!(matches!(err, CodecError::InvalidJson(_)));
}

#[test]
fn engine_ping_and_pong_carry_optional_payload() {
    assert_eq!(decode_engine("2").expect("ping"), EnginePacket::Ping(None));
    assert_eq!(decode_engine("2beat").expect("ping"), EnginePacket::Ping(Some("beat".to_owned())));
    assert_eq!(encode_engine(&EnginePacket::Pong(None)), "3");
    assert_eq!(encode_engine(&EnginePacket::Pong(Some("beat".to_owned()))), "3beat");
}

#[test]
fn engine_control_packets_use_single_digits() {
    assert_eq!(encode_engine(&EnginePacket::Close), "1");
    assert_eq!(encode_engine(&EnginePacket::Upgrade), "5");
    assert_eq!(encode_engine(&EnginePacket::Noop), "6");
    assert_eq!(decode_engine("1").expect("close"), EnginePacket::Close);
    assert_eq!(decode_engine("6").expect("noop"), EnginePacket::Noop);
}

#[test]
fn decode_engine_rejects_empty_and_unknown() {
    assert!(matches!(decode_engine(""), Err(CodecError::Empty)));
    assert!(matches!(
        decode_engine("9"),
        Err(CodecError::UnknownType { layer: "engine.io", found: '9' })
    ));
}

#[test]
fn connect_packet_encodes_default_namespace_as_bare_type() {
    assert_eq!(encode_socket(&SocketPacket::connect()), "0");
    assert_eq!(encode_message(&SocketPacket::connect()), "40");
    assert_eq!(encode_message(&SocketPacket::disconnect()), "41");
}

#[test]
fn decode_connect_ack_keeps_sid_payload() {
    let packet = decode_socket(r#"0{"sid":"abc"}"#).expect("connect");
    assert_eq!(
        packet,
        SocketPacket::Connect { namespace: "/".to_owned(), data: Some(json!({"sid": "abc"})) }
    );
}

#[test]
fn subscribe_event_matches_platform_wire_format() {
    assert_eq!(
        encode_message(&subscribe_to_results(42)),
        r#"42["subscribe-to-results",{"taskId":42}]"#
    );
    assert_eq!(
        encode_message(&unsubscribe_from_results(7)),
        r#"42["unsubscribe-from-results",{"taskId":7}]"#
    );
}

#[test]
fn decode_event_splits_name_and_args() {
    let packet = decode_socket(r#"2["test-result",{"taskId":3,"status":"SUCCESS"}]"#).expect("event");
    assert_eq!(
        packet,
        SocketPacket::Event {
            namespace: "/".to_owned(),
            ack_id: None,
            name: TEST_RESULT.to_owned(),
            args: vec![json!({"taskId": 3, "status": "SUCCESS"})],
        }
    );
}

#[test]
fn decode_event_reads_namespace_and_ack_id() {
    let packet = decode_socket(r#"2/admin,13["task-status","RUNNING"]"#).expect("event");
    let SocketPacket::Event { namespace, ack_id, name, args } = packet else {
        panic!("expected event");
    };
    assert_eq!(namespace, "/admin");
    assert_eq!(ack_id, Some(13));
    assert_eq!(name, TASK_STATUS);
    assert_eq!(args, vec![json!("RUNNING")]);
}

#[test]
fn encode_event_with_namespace_and_ack_id() {
    let packet = SocketPacket::Event {
        namespace: "/admin".to_owned(),
        ack_id: Some(5),
        name: "ping".to_owned(),
        args: Vec::new(),
    };
    assert_eq!(encode_socket(&packet), r#"2/admin,5["ping"]"#);
}

#[test]
fn decode_event_rejects_missing_or_non_string_name() {
    assert!(matches!(decode_socket("2[]"), Err(CodecError::MalformedEvent(_))));
    assert!(matches!(decode_socket("2[1,2]"), Err(CodecError::MalformedEvent(_))));
    assert!(matches!(decode_socket(r#"2{"a":1}"#), Err(CodecError::MalformedEvent(_))));
    assert!(matches!(decode_socket("2"), Err(CodecError::MalformedEvent(_))));
}

#[test]
fn decode_ack_requires_id() {
    let packet = decode_socket(r#"31["ok"]"#).expect("ack");
    assert_eq!(
        packet,
        SocketPacket::Ack { namespace: "/".to_owned(), ack_id: 1, args: vec![json!("ok")] }
    );
    assert!(matches!(decode_socket(r#"3["ok"]"#), Err(CodecError::MissingAckId)));
}

#[test]
fn decode_connect_error_keeps_message() {
    let packet = decode_socket(r#"4{"message":"Not authorized"}"#).expect("connect error");
    let SocketPacket::ConnectError { data, .. } = packet else {
        panic!("expected connect error");
    };
    assert_eq!(data, Some(json!({"message": "Not authorized"})));
}

#[test]
fn decode_socket_rejects_binary_and_unknown_types() {
    assert!(matches!(decode_socket(r#"51-["upload",{}]"#), Err(CodecError::BinaryUnsupported)));
    assert!(matches!(decode_socket("61-[]"), Err(CodecError::BinaryUnsupported)));
    assert!(matches!(
        decode_socket("8"),
        Err(CodecError::UnknownType { layer: "socket.io", found: '8' })
    ));
    assert!(matches!(decode_socket(""), Err(CodecError::Empty)));
}

#[test]
fn namespace_without_payload_is_parsed() {
    let packet = decode_socket("1/admin,").expect("disconnect");
    assert_eq!(packet.namespace(), "/admin");
    let packet = decode_socket("1/admin").expect("disconnect");
    assert_eq!(packet.namespace(), "/admin");
}

#[test]
fn result_subscription_serializes_camel_case() {
    let value = serde_json::to_value(ResultSubscription { task_id: 9 }).expect("serialize");
    assert_eq!(value, json!({"taskId": 9}));
}
