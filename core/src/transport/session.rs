//! Connection-phase state machine and the single-connection WebSocket
//! session: HTTP Upgrade handshake, frame pump, ping/pong keepalive.
//! `spec.md` §3 ("Session") and §4.4.
//!
//! `WsClient<S>` owns exactly one connection attempt. Reconnection (waiting
//! `reconnect_delay_ms` after a disconnect, then building a fresh
//! `Transport` and a fresh `WsClient`) is the SDK facade's job
//! (`core::sdk::Sdk::handle`), not this type's — matching the original's
//! global-context ownership note in `spec.md` DESIGN NOTES.

use super::frame::{self, Opcode};
use super::handshake;
use crate::clock::Rng;
use crate::crypto::Crypto;
use crate::error::LinkError;
use std::io::{self, Read, Write};

/// `spec.md` §4.4's connection phase state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Disconnected,
    DnsLookup,
    TcpConnecting,
    TlsHandshake,
    WsHandshake,
    Connected,
    Closing,
    Error,
}

/// Accumulator cap: a malicious or broken peer that never completes a
/// handshake or sends a frame whose claimed length is absurd must not grow
/// this buffer without bound.
const MAX_RX_ACCUMULATOR_BYTES: usize = 64 * 1024;

/// Inbound text message handed up from [`WsClient::tick`] to the caller
/// (the SDK facade, which pushes it onto the rx queue).
#[derive(Debug)]
pub enum SessionEvent {
    Message(Vec<u8>),
    Closed,
}

pub struct WsClient<S> {
    stream: S,
    phase: ConnectionPhase,
    rx_accum: Vec<u8>,
    handshake_key: String,
    last_ping_ms: Option<u64>,
    last_pong_ms: Option<u64>,
    ping_pending: bool,
    ping_interval_ms: u64,
    ping_timeout_ms: u64,
}

impl<S: Read + Write> WsClient<S> {
    /// Performs the blocking HTTP Upgrade handshake over an
    /// already-connected `stream` (TCP or TLS connect happens before this
    /// is called — see [`super::stream::connect_blocking`]). On success,
    /// phase is `Connected` and the caller should switch the stream to
    /// non-blocking before the first [`WsClient::tick`].
    #[allow(clippy::too_many_arguments)]
    pub fn handshake(
        mut stream: S,
        crypto: &dyn Crypto,
        rng: &mut dyn Rng,
        host: &str,
        path: &str,
        app_key: &str,
        device_ids: &[String],
        platform: &str,
        sdk_version: &str,
        ping_interval_ms: u64,
        ping_timeout_ms: u64,
        now_ms: u64,
    ) -> Result<Self, LinkError> {
        let mut key_bytes = [0u8; 16];
        rng.fill_bytes(&mut key_bytes);
        let key_base64 = crypto.base64_encode(&key_bytes);

        let request =
            handshake::build_upgrade_request(host, path, &key_base64, app_key, device_ids, platform, sdk_version);
        stream
            .write_all(request.as_bytes())
            .map_err(LinkError::TcpConnect)?;

        let mut accum = Vec::new();
        let mut buf = [0u8; 1024];
        let (response, consumed) = loop {
            let n = stream.read(&mut buf).map_err(LinkError::TcpConnect)?;
            if n == 0 {
                return Err(LinkError::TransportReset(
                    "connection closed during handshake".to_string(),
                ));
            }
            accum.extend_from_slice(&buf[..n]);
            if accum.len() > MAX_RX_ACCUMULATOR_BYTES {
                return Err(LinkError::TransportReset(
                    "handshake response exceeded accumulator bound".to_string(),
                ));
            }
            if let Some(parsed) = handshake::parse_response(&accum)? {
                break parsed;
            }
        };
        handshake::validate(crypto, &response, &key_base64)?;

        let leftover = accum[consumed..].to_vec();

        Ok(Self {
            stream,
            phase: ConnectionPhase::Connected,
            rx_accum: leftover,
            handshake_key: key_base64,
            // Seeded to the connection time, not `None`: the keepalive
            // check measures "since last ping" against this baseline, so a
            // freshly connected session waits a full `ping_interval_ms`
            // before its first PING instead of firing one immediately.
            last_ping_ms: Some(now_ms),
            last_pong_ms: None,
            ping_pending: false,
            ping_interval_ms,
            ping_timeout_ms,
        })
    }

    #[must_use]
    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    /// Access to the underlying stream, so the facade can flip it to
    /// non-blocking mode right after a successful handshake (the
    /// handshake itself needs a blocking read; `tick()` does not).
    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    #[must_use]
    pub fn handshake_key(&self) -> &str {
        &self.handshake_key
    }

    /// Sends a masked text frame.
    pub fn send_text(&mut self, rng: &mut dyn Rng, payload: &[u8]) -> Result<(), LinkError> {
        self.send_frame(rng, Opcode::Text, payload)
    }

    fn send_frame(&mut self, rng: &mut dyn Rng, opcode: Opcode, payload: &[u8]) -> Result<(), LinkError> {
        if self.phase != ConnectionPhase::Connected {
            return Err(LinkError::NotConnected);
        }
        let mask_key = rng.next_u32().to_be_bytes();
        let encoded = frame::encode(opcode, payload, Some(mask_key));
        self.stream.write_all(&encoded).map_err(|e| {
            self.phase = ConnectionPhase::Error;
            LinkError::TransportReset(e.to_string())
        })
    }

    /// Best-effort close: sends a CLOSE frame (ignoring write failures,
    /// per `spec.md` §5's "pending tx frames may be dropped") and marks
    /// the session as closing.
    pub fn close(&mut self, rng: &mut dyn Rng) {
        let _ = self.send_frame(rng, Opcode::Close, &[]);
        self.phase = ConnectionPhase::Closing;
    }

    /// Non-blocking pump: reads whatever bytes are currently available,
    /// decodes complete frames, answers pings, tracks pongs, and returns
    /// any text messages for the caller to enqueue. Also runs the
    /// keepalive check, transitioning to `Error` on ping timeout.
    pub fn tick(&mut self, now_ms: u64, rng: &mut dyn Rng) -> Result<Vec<SessionEvent>, LinkError> {
        if self.phase != ConnectionPhase::Connected {
            return Ok(Vec::new());
        }

        self.read_available()?;

        let mut events = Vec::new();
        loop {
            match frame::decode(&self.rx_accum)? {
                None => break,
                Some((frame, consumed)) => {
                    self.rx_accum.drain(..consumed);
                    match frame.opcode {
                        Opcode::Text | Opcode::Binary => {
                            events.push(SessionEvent::Message(frame.payload));
                        }
                        Opcode::Ping => {
                            self.send_frame(rng, Opcode::Pong, &frame.payload)?;
                        }
                        Opcode::Pong => {
                            self.last_pong_ms = Some(now_ms);
                            self.ping_pending = false;
                        }
                        Opcode::Close => {
                            self.phase = ConnectionPhase::Disconnected;
                            events.push(SessionEvent::Closed);
                            return Ok(events);
                        }
                        Opcode::Continuation => {}
                    }
                }
            }
        }

        self.run_keepalive(now_ms, rng)?;
        Ok(events)
    }

    fn read_available(&mut self) -> Result<(), LinkError> {
        let mut buf = [0u8; 4096];
        loop {
            match self.stream.read(&mut buf) {
                Ok(0) => {
                    self.phase = ConnectionPhase::Disconnected;
                    return Ok(());
                }
                Ok(n) => {
                    self.rx_accum.extend_from_slice(&buf[..n]);
                    if self.rx_accum.len() > MAX_RX_ACCUMULATOR_BYTES {
                        self.phase = ConnectionPhase::Error;
                        return Err(LinkError::TransportReset(
                            "rx accumulator exceeded bound".to_string(),
                        ));
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.phase = ConnectionPhase::Error;
                    return Err(LinkError::TransportReset(e.to_string()));
                }
            }
        }
    }

    fn run_keepalive(&mut self, now_ms: u64, rng: &mut dyn Rng) -> Result<(), LinkError> {
        let since_last_ping = self.last_ping_ms.map_or(u64::MAX, |t| now_ms.saturating_sub(t));

        if !self.ping_pending && since_last_ping >= self.ping_interval_ms {
            self.send_frame(rng, Opcode::Ping, &[])?;
            self.last_ping_ms = Some(now_ms);
            self.ping_pending = true;
            return Ok(());
        }

        if self.ping_pending {
            let since_ping_sent = self.last_ping_ms.map_or(0, |t| now_ms.saturating_sub(t));
            if since_ping_sent >= self.ping_timeout_ms {
                self.phase = ConnectionPhase::Error;
                return Err(LinkError::TransportReset(
                    "ping timeout: no pong received".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::fake::FakeRng;
    use crate::crypto::HostCrypto;
    use std::collections::VecDeque;

    /// An in-memory duplex pipe standing in for the network collaborator,
    /// per `SPEC_FULL.md`'s test-tooling note.
    #[derive(Default)]
    struct MockStream {
        inbound: VecDeque<u8>,
        outbound: Vec<u8>,
    }

    impl MockStream {
        fn feed(&mut self, bytes: &[u8]) {
            self.inbound.extend(bytes);
        }
    }

    impl Read for MockStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.inbound.is_empty() {
                return Err(io::Error::new(io::ErrorKind::WouldBlock, "no data"));
            }
            let n = buf.len().min(self.inbound.len());
            for slot in buf.iter_mut().take(n) {
                *slot = self.inbound.pop_front().unwrap();
            }
            Ok(n)
        }
    }

    impl Write for MockStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.outbound.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn handshake_response(crypto: &HostCrypto, key: &str) -> Vec<u8> {
        let accept = handshake::expected_accept(crypto, key);
        format!("HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\nConnection: Upgrade\r\nSec-WebSocket-Accept: {accept}\r\n\r\n").into_bytes()
    }

    fn connected_client() -> WsClient<MockStream> {
        let crypto = HostCrypto;
        let mut rng = FakeRng::constant(0x0101_0101);
        let mut stream = MockStream::default();
        // The handshake call writes the request; we pre-load the fixed
        // response body using whatever key the fixed rng will produce.
        let key_bytes = [1u8; 16];
        let key_base64 = crypto.base64_encode(&key_bytes);
        stream.feed(&handshake_response(&crypto, &key_base64));

        WsClient::handshake(
            stream,
            &crypto,
            &mut rng,
            "ws.sinric.pro",
            "/",
            "app-key",
            &["aaaaaaaaaaaaaaaaaaaaaaaa".to_string()],
            "rust-generic",
            "1.0.0",
            300_000,
            10_000,
            0,
        )
        .unwrap()
    }

    #[test]
    fn handshake_succeeds_and_reaches_connected() {
        let client = connected_client();
        assert_eq!(client.phase(), ConnectionPhase::Connected);
    }

    #[test]
    fn handshake_rejects_mismatched_status() {
        let crypto = HostCrypto;
        let mut rng = FakeRng::constant(7);
        let mut stream = MockStream::default();
        stream.feed(b"HTTP/1.1 403 Forbidden\r\n\r\n");
        let err = WsClient::handshake(
            stream,
            &crypto,
            &mut rng,
            "host",
            "/",
            "key",
            &[],
            "platform",
            "1.0.0",
            1000,
            1000,
            0,
        )
        .unwrap_err();
        assert!(matches!(err, LinkError::HandshakeRejected { status: 403 }));
    }

    #[test]
    fn tick_decodes_server_text_message() {
        let mut client = connected_client();
        let mut rng = FakeRng::constant(2);
        client
            .stream
            .feed(&frame::encode(Opcode::Text, b"{\"hello\":true}", None));
        let events = client.tick(0, &mut rng).unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            SessionEvent::Message(bytes) => assert_eq!(bytes, b"{\"hello\":true}"),
            SessionEvent::Closed => panic!("expected a message event"),
        }
    }

    #[test]
    fn tick_answers_incoming_ping_with_pong() {
        let mut client = connected_client();
        let mut rng = FakeRng::constant(3);
        client.stream.feed(&frame::encode(Opcode::Ping, b"abc", None));
        client.tick(0, &mut rng).unwrap();
        let (decoded, _) = frame::decode(&client.stream.outbound).unwrap().unwrap();
        assert_eq!(decoded.opcode, Opcode::Pong);
    }

    #[test]
    fn sends_ping_after_interval_elapses() {
        let mut client = connected_client();
        let mut rng = FakeRng::constant(4);
        client.stream.outbound.clear();
        client.tick(300_000, &mut rng).unwrap();
        let (decoded, _) = frame::decode(&client.stream.outbound).unwrap().unwrap();
        assert_eq!(decoded.opcode, Opcode::Ping);
    }

    #[test]
    fn ping_timeout_without_pong_errors() {
        let mut client = connected_client();
        let mut rng = FakeRng::constant(5);
        client.tick(300_000, &mut rng).unwrap(); // sends ping
        let err = client.tick(310_001, &mut rng).unwrap_err();
        assert!(matches!(err, LinkError::TransportReset(_)));
        assert_eq!(client.phase(), ConnectionPhase::Error);
    }

    #[test]
    fn close_frame_from_server_disconnects() {
        let mut client = connected_client();
        let mut rng = FakeRng::constant(6);
        client.stream.feed(&frame::encode(Opcode::Close, &[], None));
        let events = client.tick(0, &mut rng).unwrap();
        assert!(matches!(events.last(), Some(SessionEvent::Closed)));
        assert_eq!(client.phase(), ConnectionPhase::Disconnected);
    }
}
