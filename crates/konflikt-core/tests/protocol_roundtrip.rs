//! Integration tests: every protocol message survives an encode/decode
//! round trip, and the wire shape matches the documented frame examples.

use konflikt_core::protocol::codec::{decode, encode};
use konflikt_core::protocol::messages::*;

fn round_trip(msg: &Message) -> Message {
    let encoded = encode(msg).expect("encode failed");
    decode(&encoded).expect("decode failed")
}

fn sample_screens() -> Vec<ScreenInfo> {
    vec![
        ScreenInfo {
            instance_id: "server-01".to_string(),
            display_name: "workstation".to_string(),
            x: 0,
            y: 0,
            width: 1920,
            height: 1080,
            is_server: true,
            online: true,
        },
        ScreenInfo {
            instance_id: "lappy-7f3a".to_string(),
            display_name: "lappy".to_string(),
            x: 1920,
            y: 0,
            width: 1280,
            height: 720,
            is_server: false,
            online: true,
        },
    ]
}

#[test]
fn test_handshake_request_round_trip() {
    let msg = Message::HandshakeRequest(HandshakeRequest {
        instance_id: "lappy-7f3a".to_string(),
        instance_name: "lappy".to_string(),
        version: "2.0.0".to_string(),
        capabilities: vec!["input_events".to_string(), "screen_info".to_string()],
        timestamp: 1_700_000_000_000,
    });
    assert_eq!(round_trip(&msg), msg);
}

#[test]
fn test_handshake_response_round_trip() {
    let msg = Message::HandshakeResponse(HandshakeResponse {
        accepted: true,
        instance_id: "server-01".to_string(),
        instance_name: "workstation".to_string(),
        version: "2.0.0".to_string(),
        capabilities: CAPABILITIES.iter().map(|s| s.to_string()).collect(),
        timestamp: 1_700_000_000_001,
    });
    assert_eq!(round_trip(&msg), msg);
}

#[test]
fn test_client_registration_round_trip() {
    let msg = Message::ClientRegistration(ClientRegistration {
        instance_id: "lappy-7f3a".to_string(),
        display_name: "lappy".to_string(),
        machine_id: "ab12cd34".to_string(),
        screen_width: 1280,
        screen_height: 720,
    });
    assert_eq!(round_trip(&msg), msg);
}

#[test]
fn test_layout_assignment_round_trip() {
    let msg = Message::LayoutAssignment(LayoutAssignment {
        position: Position { x: 1920, y: 0 },
        adjacency: AdjacencyInfo {
            left: Some("server-01".to_string()),
            ..Default::default()
        },
        full_layout: sample_screens(),
    });
    assert_eq!(round_trip(&msg), msg);
}

#[test]
fn test_layout_update_round_trip() {
    let msg = Message::LayoutUpdate(LayoutUpdate {
        screens: sample_screens(),
        timestamp: 1_700_000_000_002,
    });
    assert_eq!(round_trip(&msg), msg);
}

#[test]
fn test_input_event_variants_round_trip() {
    let cases = [
        (EventKind::MouseMove, InputEventData { x: 42, y: 100, dx: 3, dy: -1, ..Default::default() }),
        (
            EventKind::MousePress,
            InputEventData { x: 10, y: 20, button: Some(MouseButton::Left), mouse_buttons: 1, ..Default::default() },
        ),
        (
            EventKind::MouseRelease,
            InputEventData { x: 10, y: 20, button: Some(MouseButton::Right), ..Default::default() },
        ),
        (EventKind::Scroll, InputEventData { x: 5, y: 5, scroll_y: -120, ..Default::default() }),
        (
            EventKind::KeyPress,
            InputEventData { keycode: 38, text: Some("a".to_string()), keyboard_modifiers: 4, ..Default::default() },
        ),
        (EventKind::KeyRelease, InputEventData { keycode: 38, ..Default::default() }),
    ];

    for (kind, data) in cases {
        let msg = Message::InputEvent(InputEvent {
            source_instance_id: "server-01".to_string(),
            source_display_id: "d1".to_string(),
            source_machine_id: "m1".to_string(),
            event_type: kind,
            event_data: data,
        });
        assert_eq!(round_trip(&msg), msg, "round trip failed for {kind:?}");
    }
}

#[test]
fn test_activate_client_round_trip() {
    let msg = Message::ActivateClient(ActivateClient {
        target_instance_id: "lappy-7f3a".to_string(),
        cursor_x: 1918,
        cursor_y: 540,
        timestamp: 3,
    });
    assert_eq!(round_trip(&msg), msg);
}

#[test]
fn test_deactivation_request_round_trip() {
    let msg = Message::DeactivationRequest(DeactivationRequest {
        instance_id: "lappy-7f3a".to_string(),
        timestamp: 4,
    });
    assert_eq!(round_trip(&msg), msg);
}

#[test]
fn test_clipboard_sync_round_trip() {
    let msg = Message::ClipboardSync(ClipboardSync {
        source_instance_id: "server-01".to_string(),
        format: CLIPBOARD_FORMAT_TEXT.to_string(),
        data: "hello".to_string(),
        sequence: 17,
        timestamp: 5,
    });
    assert_eq!(round_trip(&msg), msg);
}

#[test]
fn test_clipboard_sync_with_unicode_payload_round_trips() {
    let msg = Message::ClipboardSync(ClipboardSync {
        source_instance_id: "server-01".to_string(),
        format: CLIPBOARD_FORMAT_TEXT.to_string(),
        data: "snø ❄ و مرحبا".to_string(),
        sequence: 18,
        timestamp: 5,
    });
    assert_eq!(round_trip(&msg), msg);
}

#[test]
fn test_server_shutdown_round_trip() {
    let msg = Message::ServerShutdown(ServerShutdown {
        reason: "restart".to_string(),
        delay_ms: 3000,
        timestamp: 6,
    });
    assert_eq!(round_trip(&msg), msg);
}

#[test]
fn test_heartbeat_round_trip() {
    let msg = Message::Heartbeat(Heartbeat { timestamp: 7 });
    assert_eq!(round_trip(&msg), msg);
}

// ── Documented wire frames ────────────────────────────────────────────────────

#[test]
fn test_documented_handshake_frame_decodes() {
    let frame = r#"{"type":"handshake_request","instanceId":"lappy-7f3a","instanceName":"lappy","version":"2.0.0","capabilities":["input_events","screen_info"],"timestamp":1700000000000}"#;
    match decode(frame).expect("documented frame must decode") {
        Message::HandshakeRequest(req) => {
            assert_eq!(req.instance_id, "lappy-7f3a");
            assert_eq!(req.capabilities.len(), 2);
        }
        other => panic!("expected handshake_request, got {other:?}"),
    }
}

#[test]
fn test_documented_activate_frame_decodes() {
    let frame = r#"{"type":"activate_client","targetInstanceId":"lappy-7f3a","cursorX":1918,"cursorY":540,"timestamp":1700000000000}"#;
    match decode(frame).expect("documented frame must decode") {
        Message::ActivateClient(msg) => {
            assert_eq!(msg.cursor_x, 1918);
            assert_eq!(msg.cursor_y, 540);
        }
        other => panic!("expected activate_client, got {other:?}"),
    }
}

#[test]
fn test_documented_layout_assignment_frame_decodes() {
    let frame = r#"{"type":"layout_assignment","position":{"x":1920,"y":0},"adjacency":{"left":"server-01"},"fullLayout":[{"instanceId":"server-01","displayName":"workstation","x":0,"y":0,"width":1920,"height":1080,"isServer":true,"online":true}]}"#;
    match decode(frame).expect("documented frame must decode") {
        Message::LayoutAssignment(msg) => {
            assert_eq!(msg.position.x, 1920);
            assert_eq!(msg.adjacency.left.as_deref(), Some("server-01"));
            assert_eq!(msg.full_layout.len(), 1);
            assert!(msg.full_layout[0].is_server);
        }
        other => panic!("expected layout_assignment, got {other:?}"),
    }
}

#[test]
fn test_documented_clipboard_frame_decodes() {
    let frame = r#"{"type":"clipboard_sync","sourceInstanceId":"server-01","format":"text/plain","data":"hello","sequence":17,"timestamp":1700000000000}"#;
    match decode(frame).expect("documented frame must decode") {
        Message::ClipboardSync(msg) => {
            assert_eq!(msg.data, "hello");
            assert_eq!(msg.sequence, 17);
        }
        other => panic!("expected clipboard_sync, got {other:?}"),
    }
}
