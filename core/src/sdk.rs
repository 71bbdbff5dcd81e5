//! SDK facade: `spec.md` §4.7. Owns the single process-wide context —
//! config, device registry, rx/tx queues, WebSocket session, state
//! callback — that `sinricpro.c` kept as hidden global state; here it is
//! one explicit, owned `Sdk` value per the DESIGN NOTES' "pass the handle
//! explicitly" redesign.

use crate::clock::{Clock, Rng, SystemClock, SystemRng};
use crate::crypto::{Crypto, HostCrypto};
use crate::device::Device;
use crate::dispatcher::{self, DispatchOutcome};
use crate::error::{ConfigError, LinkError, SdkError};
use crate::json::{self, Envelope, EventCause};
use crate::queue::{Interface, MessageQueue};
use crate::registry::DeviceRegistry;
use crate::transport::{self, ConnectionPhase, SessionEvent, Transport, WsClient};
use std::io::{Read, Write};
use std::time::Duration;

/// `spec.md` §4.7's enumerated configuration options.
#[derive(Debug, Clone)]
pub struct Config {
    pub app_key: String,
    pub app_secret: String,
    pub server_url: String,
    pub server_port: u16,
    pub use_ssl: bool,
    pub connect_timeout_ms: u64,
    pub ping_interval_ms: u64,
    pub ping_timeout_ms: u64,
    pub reconnect_delay_ms: u64,
    pub enable_debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_key: String::new(),
            app_secret: String::new(),
            server_url: "ws.sinric.pro".to_string(),
            server_port: 443,
            use_ssl: true,
            connect_timeout_ms: 30_000,
            ping_interval_ms: 300_000,
            ping_timeout_ms: 10_000,
            reconnect_delay_ms: 5_000,
            enable_debug: false,
        }
    }
}

impl Drop for Config {
    /// `app_secret` signs every outbound message; it is wiped rather than
    /// left sitting in freed memory once the config is dropped.
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.app_secret.zeroize();
    }
}

impl Config {
    fn validate(&self) -> Result<(), SdkError> {
        if self.app_key.is_empty() {
            return Err(SdkError::Config(ConfigError::MissingAppKey));
        }
        if self.app_secret.is_empty() {
            return Err(SdkError::Config(ConfigError::MissingAppSecret));
        }
        if self.server_url.is_empty() {
            return Err(SdkError::Config(ConfigError::MissingServerUrl));
        }
        Ok(())
    }

    fn default_port(&self) -> u16 {
        if self.server_port != 0 {
            self.server_port
        } else if self.use_ssl {
            443
        } else {
            80
        }
    }
}

/// The monotonic SDK-level state stream from `spec.md` §4.7/§7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdkState {
    Disconnected,
    WifiConnecting,
    WifiConnected,
    WsConnecting,
    Connected,
    Error,
}

/// Platform/version identifiers sent in the HTTP Upgrade headers
/// (`spec.md` §4.4). Resolves the "two ABI forms" open question from
/// `spec.md` DESIGN NOTES by fixing concrete values — see `DESIGN.md`.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PLATFORM_ID: &str = "rust-generic";

/// The SDK facade. Generic over the transport stream type so the core
/// pipeline (dispatch, queues, capabilities) is exercisable against an
/// in-memory mock in tests; real callers use the `Sdk<Transport>` alias
/// produced by [`Sdk::init`]. The lifetime `'a` is `spec.md` §3's device
/// registry contract made explicit: registered devices are borrowed, not
/// owned, and must outlive the `Sdk`.
pub struct Sdk<'a, S = Transport> {
    config: Config,
    registry: DeviceRegistry<'a>,
    rx: MessageQueue,
    tx: MessageQueue,
    session: Option<WsClient<S>>,
    clock: Box<dyn Clock>,
    rng: Box<dyn Rng>,
    crypto: Box<dyn Crypto>,
    state: SdkState,
    state_callback: Option<Box<dyn FnMut(SdkState)>>,
    last_disconnect_ms: Option<u64>,
    auto_reconnect: bool,
}

impl<'a, S> Sdk<'a, S> {
    /// `spec.md` §4.7 `init(config)`: validates credentials and returns a
    /// facade that has not yet connected. `ConfigError` surfaces here and
    /// the SDK refuses to proceed to `begin()`.
    pub fn init(config: Config) -> Result<Self, SdkError> {
        config.validate()?;
        Ok(Self {
            config,
            registry: DeviceRegistry::new(),
            rx: MessageQueue::new(),
            tx: MessageQueue::new(),
            session: None,
            clock: Box::new(SystemClock::new()),
            rng: Box::new(SystemRng),
            crypto: Box::new(HostCrypto),
            state: SdkState::Disconnected,
            state_callback: None,
            last_disconnect_ms: None,
            auto_reconnect: true,
        })
    }

    /// Registers a user-owned device. `spec.md` §3: the registry borrows
    /// `device` rather than taking it, so `device` must outlive `self` and
    /// the caller keeps direct access to it for as long as it stays
    /// unregistered.
    pub fn add_device(&mut self, device: &'a mut Device) -> Result<(), SdkError> {
        self.registry.add_device(device)
    }

    /// Forgets the device and hands the caller's reference back.
    pub fn remove_device(&mut self, device_id: &str) -> Option<&'a mut Device> {
        self.registry.remove_device(device_id)
    }

    #[must_use]
    pub fn find_device(&self, device_id: &str) -> Option<&Device> {
        self.registry.find_device(device_id)
    }

    pub fn find_device_mut(&mut self, device_id: &str) -> Option<&mut Device> {
        self.registry.find_device_mut(device_id)
    }

    pub fn on_state_change<F>(&mut self, callback: F)
    where
        F: FnMut(SdkState) + 'static,
    {
        self.state_callback = Some(Box::new(callback));
    }

    #[must_use]
    pub fn state(&self) -> SdkState {
        self.state
    }

    /// Sets a server-delivered epoch offset (`spec.md` §4.3's advisory
    /// timestamp model). No wire path calls this automatically.
    pub fn set_epoch_offset(&mut self, offset_seconds: i64) {
        self.clock.set_epoch_offset(offset_seconds);
    }

    fn set_state(&mut self, state: SdkState) {
        if self.state == state {
            return;
        }
        self.state = state;
        if let Some(cb) = self.state_callback.as_mut() {
            cb(state);
        }
    }

    /// `send_event(device_id, action, value)`: the `action + value` ABI
    /// mandated by `spec.md` DESIGN NOTES (the one-argument legacy form is
    /// not implemented). Signs and enqueues on tx; returns `false` (and
    /// logs) on queue overflow rather than erroring, matching `spec.md`
    /// §7's `Overflow` propagation policy.
    pub fn send_event(&mut self, device_id: &str, action: &str, value: serde_json::Value) -> bool {
        self.send_event_with_cause(device_id, action, EventCause::PhysicalInteraction, value)
    }

    pub fn send_event_with_cause(
        &mut self,
        device_id: &str,
        action: &str,
        cause: EventCause,
        value: serde_json::Value,
    ) -> bool {
        let message_id = uuid::Uuid::new_v4().to_string();
        let payload = json::event_payload(device_id, action, cause, value, self.clock.epoch_seconds(), message_id);
        let envelope = Envelope {
            header: crate::json::Header::default(),
            payload,
            signature: crate::json::Signature { hmac: String::new() },
        };
        let Ok(unsigned) = envelope.to_canonical_json() else {
            tracing::error!(device_id, action, "failed to serialize event envelope");
            return false;
        };
        let Ok(hmac) = crate::signature::sign(self.crypto.as_ref(), &self.config.app_secret, &unsigned) else {
            tracing::error!(device_id, action, "failed to sign event envelope");
            return false;
        };
        let mut signed = envelope;
        signed.signature.hmac = hmac;
        let Ok(bytes) = signed.to_canonical_json() else {
            return false;
        };
        match self.tx.push(Interface::WebSocket, bytes.as_bytes()) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(device_id, action, error = %e, "send_event dropped: tx queue overflow");
                false
            }
        }
    }
}

impl<'a, S: Read + Write> Sdk<'a, S> {
    /// Injects an already-handshaken session. Production code reaches
    /// this indirectly through [`Sdk::begin`] (which builds the session
    /// itself via [`transport::connect_blocking`]); tests construct a
    /// `WsClient` over an in-memory stream and hand it in directly.
    pub fn attach_session(&mut self, session: WsClient<S>) {
        self.session = Some(session);
        self.set_state(SdkState::Connected);
    }

    /// Runs one cooperative iteration against whatever session is
    /// attached: pumps transport I/O, dispatches any complete requests,
    /// and flushes queued responses/events to the wire. Exposed generically
    /// (not just for `Sdk<Transport>`) so the pipeline is exercisable
    /// against an in-memory stream without a live network connection;
    /// [`Sdk::handle`] wraps this with reconnect gating for real sessions.
    pub fn tick(&mut self) -> Result<(), SdkError> {
        self.pump_session();
        self.drain_and_dispatch();
        self.flush_tx();
        Ok(())
    }

    /// `spec.md` §5's "pumps transport I/O" step: drains whatever frames
    /// are available on the active session into the rx queue, and retires
    /// the session on close/error so the next `handle()` reconnects.
    fn pump_session(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let now_ms = self.clock.now_ms();
        match session.tick(now_ms, self.rng.as_mut()) {
            Ok(events) => {
                for event in events {
                    match event {
                        SessionEvent::Message(bytes) => {
                            if self.rx.push(Interface::WebSocket, &bytes).is_err() {
                                tracing::warn!("dropping inbound frame: rx queue overflow");
                            }
                        }
                        SessionEvent::Closed => {
                            self.session = None;
                            self.last_disconnect_ms = Some(now_ms);
                            self.set_state(SdkState::Disconnected);
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "websocket session error");
                self.session = None;
                self.last_disconnect_ms = Some(now_ms);
                self.set_state(SdkState::Error);
            }
        }
    }

    /// `spec.md` §4.6: drains rx into the dispatcher, enqueuing any
    /// responses it produces.
    fn drain_and_dispatch(&mut self) {
        while let Some((_, bytes)) = self.rx.pop() {
            match dispatcher::dispatch(
                &bytes,
                &mut self.registry,
                self.crypto.as_ref(),
                self.clock.as_ref(),
                &self.config.app_secret,
            ) {
                DispatchOutcome::Respond(envelope) => match envelope.to_canonical_json() {
                    Ok(serialized) => {
                        if self.tx.push(Interface::WebSocket, serialized.as_bytes()).is_err() {
                            tracing::warn!("dropping response: tx queue overflow");
                        }
                    }
                    Err(e) => tracing::error!(error = %e, "failed to serialize response"),
                },
                DispatchOutcome::Noop | DispatchOutcome::Dropped(_) => {}
            }
        }
    }

    /// `spec.md` §5: transmits queued tx messages to the wire, in order.
    fn flush_tx(&mut self) {
        loop {
            let Some(session) = self.session.as_mut() else {
                break;
            };
            if session.phase() != ConnectionPhase::Connected {
                break;
            }
            let Some((_, bytes)) = self.tx.peek() else {
                break;
            };
            match session.send_text(self.rng.as_mut(), &bytes) {
                Ok(()) => {
                    self.tx.pop();
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to flush tx message, will retry");
                    break;
                }
            }
        }
    }

    /// Best-effort CLOSE and session teardown. `spec.md` §5: pending tx
    /// frames may be dropped.
    pub fn disconnect(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.close(self.rng.as_mut());
        }
        self.session = None;
        self.last_disconnect_ms = Some(self.clock.now_ms());
        self.set_state(SdkState::Disconnected);
    }

    pub fn stop(&mut self) {
        self.disconnect();
        self.auto_reconnect = false;
    }
}

impl<'a> Sdk<'a, Transport> {
    /// `spec.md` §4.7 `begin()`: the blocking DNS → TCP → (TLS) → HTTP
    /// Upgrade sequence, bounded by `connect_timeout_ms`.
    pub fn begin(&mut self) -> Result<(), SdkError> {
        self.set_state(SdkState::WsConnecting);
        let device_ids: Vec<String> = self.registry.iter_mut().map(|d| d.id().to_string()).collect();
        let transport = transport::connect_blocking(
            &self.config.server_url,
            self.config.default_port(),
            self.config.use_ssl,
            Duration::from_millis(self.config.connect_timeout_ms),
        )
        .map_err(|e| {
            self.set_state(SdkState::Error);
            SdkError::Link(e)
        })?;

        let mut session = WsClient::handshake(
            transport,
            self.crypto.as_ref(),
            self.rng.as_mut(),
            &self.config.server_url,
            "/",
            &self.config.app_key,
            &device_ids,
            PLATFORM_ID,
            SDK_VERSION,
            self.config.ping_interval_ms,
            self.config.ping_timeout_ms,
            self.clock.now_ms(),
        )
        .map_err(|e| {
            self.set_state(SdkState::Error);
            SdkError::Link(e)
        })?;

        if session.phase() != ConnectionPhase::Connected {
            self.set_state(SdkState::Error);
            return Err(SdkError::Link(LinkError::NotConnected));
        }

        // The handshake itself needed a blocking read; `tick()` is a
        // non-blocking poll and relies on getting `WouldBlock` back
        // rather than stalling the caller's loop.
        session.stream_mut().set_nonblocking(true).map_err(|e| {
            self.set_state(SdkState::Error);
            SdkError::Link(LinkError::TcpConnect(e))
        })?;

        self.attach_session(session);
        Ok(())
    }

    /// The cooperative tick: pumps I/O, dispatches, flushes tx, then runs
    /// reconnect gating. Order matches `sinricpro_handle()` in the
    /// original SDK, per `SPEC_FULL.md` §5.8.
    pub fn handle(&mut self) -> Result<(), SdkError> {
        self.tick()?;
        self.maybe_reconnect();
        Ok(())
    }

    /// `spec.md` §4.4 "Reconnect" / invariant 10: retries from
    /// `DNS_LOOKUP` no earlier than `reconnect_delay_ms` after the last
    /// disconnect timestamp.
    fn maybe_reconnect(&mut self) {
        if self.session.is_some() || !self.auto_reconnect {
            return;
        }
        let Some(last_disconnect) = self.last_disconnect_ms else {
            return;
        };
        let now_ms = self.clock.now_ms();
        if now_ms.saturating_sub(last_disconnect) < self.config.reconnect_delay_ms {
            return;
        }
        if let Err(e) = self.begin() {
            tracing::warn!(error = %e, "reconnect attempt failed");
            self.last_disconnect_ms = Some(now_ms);
        }
    }
}
