//! End-to-end scenarios driven entirely through the public `Sdk` facade
//! and an in-memory duplex stream: handshake, request dispatch, response
//! signing, event emission, and rejection of tampered messages.

use sinric_core::capability::CallbackOutcome;
use sinric_core::crypto::HostCrypto;
use sinric_core::device::{Device, DeviceKind};
use sinric_core::json::{Cause, Envelope, EventCause, Header, MessageType, Payload, Signature};
use sinric_core::transport::frame::{self, Opcode};
use sinric_core::transport::{handshake, WsClient};
use sinric_core::{queue, signature, Config, DeviceBuilder, Sdk, SdkState};
use sinric_core::clock::SystemRng;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};

const APP_KEY: &str = "app-key-1";
const APP_SECRET: &str = "app-secret-1";
const SWITCH_ID: &str = "aaaaaaaaaaaaaaaaaaaaaaaa";

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<VecDeque<u8>>>);

impl SharedBuf {
    fn push(&self, bytes: &[u8]) {
        self.0.lock().unwrap().extend(bytes);
    }

    fn drain_all(&self) -> Vec<u8> {
        self.0.lock().unwrap().drain(..).collect()
    }
}

/// An in-memory duplex pipe standing in for the network, shared with the
/// test via cloned handles so bytes can be injected/inspected after the
/// stream itself is moved into `WsClient::handshake` and then
/// `Sdk::attach_session`.
///
/// The handshake request/response round trip happens inline on first
/// read: `WsClient::handshake` writes the Upgrade request (landing
/// synchronously in `outbound`) and then blocks on a single `read` call
/// expecting the response, so the response is computed and fed into
/// `inbound` lazily, the moment that first read is observed, from
/// whatever key the request actually carried.
struct MockStream {
    inbound: SharedBuf,
    outbound: SharedBuf,
    handshake_seeded: bool,
}

impl MockStream {
    fn new(inbound: SharedBuf, outbound: SharedBuf) -> Self {
        Self {
            inbound,
            outbound,
            handshake_seeded: false,
        }
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.handshake_seeded {
            self.handshake_seeded = true;
            let request = String::from_utf8(self.outbound.drain_all()).unwrap();
            let key = request
                .lines()
                .find_map(|line| line.strip_prefix("Sec-WebSocket-Key: "))
                .expect("request must carry a Sec-WebSocket-Key header")
                .trim()
                .to_string();
            let accept = handshake::expected_accept(&HostCrypto, &key);
            let response = format!(
                "HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\nConnection: Upgrade\r\nSec-WebSocket-Accept: {accept}\r\n\r\n"
            );
            self.inbound.push(response.as_bytes());
        }
        let mut guard = self.inbound.0.lock().unwrap();
        if guard.is_empty() {
            return Err(io::Error::new(io::ErrorKind::WouldBlock, "no data"));
        }
        let n = buf.len().min(guard.len());
        for slot in buf.iter_mut().take(n) {
            *slot = guard.pop_front().unwrap();
        }
        Ok(n)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.outbound.push(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn config() -> Config {
    Config {
        app_key: APP_KEY.to_string(),
        app_secret: APP_SECRET.to_string(),
        ..Config::default()
    }
}

/// Builds a switch device with its callbacks wired up. Callers declare
/// this before the `Sdk` so the device outlives the registry that borrows
/// it (`spec.md` §3).
fn switch_device() -> Device {
    let mut device = DeviceBuilder::new(SWITCH_ID, DeviceKind::Switch)
        .expect("valid device id")
        .with_power_state()
        .with_brightness()
        .build();
    device.power_state.as_mut().unwrap().on_set(CallbackOutcome::ok);
    device.brightness.as_mut().unwrap().on_set(CallbackOutcome::ok);
    device
}

/// Builds an `Sdk` whose session is a handshaken `MockStream` carrying
/// `device`, returning the sdk plus the shared outbound/inbound buffers so
/// the test can inspect what the client sent and inject server traffic.
fn connected_sdk_with_switch(device: &mut Device) -> (Sdk<'_, MockStream>, SharedBuf, SharedBuf) {
    let crypto = HostCrypto;
    let mut rng = SystemRng;

    let inbound = SharedBuf::default();
    let outbound = SharedBuf::default();
    let stream = MockStream::new(inbound.clone(), outbound.clone());

    let session = WsClient::handshake(
        stream,
        &crypto,
        &mut rng,
        "ws.example.test",
        "/",
        APP_KEY,
        &[SWITCH_ID.to_string()],
        "rust-generic",
        "1.0.0",
        300_000,
        10_000,
        0,
    )
    .expect("handshake against the mock server must succeed");

    // Clear whatever the handshake itself wrote/seeded so scenario
    // assertions below start from a clean slate.
    outbound.drain_all();
    inbound.drain_all();

    let mut sdk: Sdk<'_, MockStream> = Sdk::init(config()).expect("valid config");
    sdk.attach_session(session);
    sdk.add_device(device).expect("device table has room");

    (sdk, outbound, inbound)
}

fn signed_request(action: &str, value: serde_json::Value, reply_token: &str) -> String {
    let crypto = HostCrypto;
    let mut envelope = Envelope {
        header: Header::default(),
        payload: Payload {
            kind: MessageType::Request,
            action: action.to_string(),
            device_id: SWITCH_ID.to_string(),
            client_id: Some("client-1".to_string()),
            reply_token: Some(reply_token.to_string()),
            message: Some("m-1".to_string()),
            created_at: 1_700_000_000,
            success: None,
            cause: None,
            value,
        },
        signature: Signature { hmac: String::new() },
    };
    let unsigned = envelope.to_canonical_json().unwrap();
    envelope.signature.hmac = signature::sign(&crypto, APP_SECRET, &unsigned).unwrap();
    envelope.to_canonical_json().unwrap()
}

#[test]
fn switch_power_request_round_trips_through_the_wire() {
    let mut device = switch_device();
    let (mut sdk, outbound, inbound) = connected_sdk_with_switch(&mut device);
    assert_eq!(sdk.state(), SdkState::Connected);

    let raw = signed_request("setPowerState", serde_json::json!({"state": "On"}), "rt-1");
    inbound.push(&frame::encode(Opcode::Text, raw.as_bytes(), None));

    sdk.tick().unwrap();

    let sent = outbound.drain_all();
    let (frame, _) = frame::decode(&sent).unwrap().expect("a response frame was written");
    assert_eq!(frame.opcode, Opcode::Text);
    let response = Envelope::from_canonical_json(std::str::from_utf8(&frame.payload).unwrap()).unwrap();
    assert_eq!(response.payload.kind, MessageType::Response);
    assert_eq!(response.payload.action, "setPowerState");
    assert_eq!(response.payload.success, Some(true));
    assert_eq!(response.payload.value, serde_json::json!({"state": "On"}));
    assert!(sdk
        .find_device(SWITCH_ID)
        .unwrap()
        .power_state
        .as_ref()
        .unwrap()
        .current());
}

#[test]
fn tampered_request_produces_no_response() {
    let mut device = switch_device();
    let (mut sdk, outbound, inbound) = connected_sdk_with_switch(&mut device);

    let raw = signed_request("setPowerState", serde_json::json!({"state": "On"}), "rt-2");
    let raw = raw.replacen("\"setPowerState\"", "\"setPowerStateEvil\"", 1);
    inbound.push(&frame::encode(Opcode::Text, raw.as_bytes(), None));

    sdk.tick().unwrap();

    assert!(outbound.drain_all().is_empty());
    assert!(!sdk
        .find_device(SWITCH_ID)
        .unwrap()
        .power_state
        .as_ref()
        .unwrap()
        .current());
}

#[test]
fn unknown_device_request_is_dropped_silently() {
    let mut device = switch_device();
    let (mut sdk, outbound, inbound) = connected_sdk_with_switch(&mut device);

    let raw = signed_request("setPowerState", serde_json::json!({"state": "On"}), "rt-3");
    let mut envelope = Envelope::from_canonical_json(&raw).unwrap();
    envelope.payload.device_id = "ffffffffffffffffffffffff".to_string();
    envelope.signature.hmac.clear();
    let unsigned = envelope.to_canonical_json().unwrap();
    envelope.signature.hmac = signature::sign(&HostCrypto, APP_SECRET, &unsigned).unwrap();
    let raw = envelope.to_canonical_json().unwrap();

    inbound.push(&frame::encode(Opcode::Text, raw.as_bytes(), None));
    sdk.tick().unwrap();

    assert!(outbound.drain_all().is_empty());
}

#[test]
fn brightness_request_clamps_out_of_range_value() {
    let mut device = switch_device();
    let (mut sdk, outbound, inbound) = connected_sdk_with_switch(&mut device);

    let raw = signed_request("setBrightness", serde_json::json!({"brightness": 150}), "rt-4");
    inbound.push(&frame::encode(Opcode::Text, raw.as_bytes(), None));

    sdk.tick().unwrap();

    let sent = outbound.drain_all();
    let (frame, _) = frame::decode(&sent).unwrap().unwrap();
    let response = Envelope::from_canonical_json(std::str::from_utf8(&frame.payload).unwrap()).unwrap();
    assert_eq!(response.payload.success, Some(true));
    assert_eq!(response.payload.value, serde_json::json!({"brightness": 100}));
}

#[test]
fn send_event_is_signed_and_reaches_the_wire() {
    let mut device = switch_device();
    let (mut sdk, outbound, _inbound) = connected_sdk_with_switch(&mut device);
    assert!(sdk.send_event_with_cause(
        SWITCH_ID,
        "currentTemperature",
        EventCause::PeriodicPoll,
        serde_json::json!({"temperature": 21.0}),
    ));
    sdk.tick().unwrap();

    let sent = outbound.drain_all();
    let (frame, _) = frame::decode(&sent).unwrap().unwrap();
    let raw = std::str::from_utf8(&frame.payload).unwrap();
    let envelope = Envelope::from_canonical_json(raw).unwrap();
    assert_eq!(envelope.payload.kind, MessageType::Event);
    assert_eq!(
        envelope.payload.cause,
        Some(Cause {
            kind: EventCause::PeriodicPoll
        })
    );
    assert!(signature::verify(
        &HostCrypto,
        APP_SECRET,
        raw,
        &envelope.signature.hmac,
        queue::MAX_MESSAGE_BYTES
    ));
}

#[test]
fn close_frame_disconnects_the_sdk() {
    let mut device = switch_device();
    let (mut sdk, _outbound, inbound) = connected_sdk_with_switch(&mut device);
    inbound.push(&frame::encode(Opcode::Close, &[], None));
    sdk.tick().unwrap();
    assert_eq!(sdk.state(), SdkState::Disconnected);
}

#[test]
fn queue_overflow_does_not_crash_the_dispatch_loop() {
    let mut device = switch_device();
    let (mut sdk, outbound, inbound) = connected_sdk_with_switch(&mut device);

    for i in 0..queue::QUEUE_CAPACITY + 2 {
        let raw = signed_request(
            "setPowerState",
            serde_json::json!({"state": if i % 2 == 0 { "On" } else { "Off" }}),
            &format!("rt-{i}"),
        );
        inbound.push(&frame::encode(Opcode::Text, raw.as_bytes(), None));
    }

    sdk.tick().unwrap();

    let sent = outbound.drain_all();
    assert!(!sent.is_empty());
}
