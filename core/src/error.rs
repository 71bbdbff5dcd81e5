//! Error taxonomy for the SDK.
//!
//! Mirrors the kinds named by the original SDK's documentation rather than
//! its actual C return codes: each top-level variant is a *kind*, carrying
//! enough detail to log or match on, not a numeric errno.

use thiserror::Error;

/// Top-level error type returned by fallible SDK operations.
#[derive(Debug, Error)]
pub enum SdkError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("link error: {0}")]
    Link(#[from] LinkError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// The event limiter blocked this emission. Not a session failure.
    #[error("rate limited")]
    RateLimited,

    #[error("overflow: {0}")]
    Overflow(#[from] OverflowKind),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("app_key must not be empty")]
    MissingAppKey,
    #[error("app_secret must not be empty")]
    MissingAppSecret,
    #[error("server_url must not be empty")]
    MissingServerUrl,
    #[error("device id {0:?} is not 24 hex characters")]
    InvalidDeviceId(String),
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("dns resolution failed for {host}: {source}")]
    DnsResolution {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("tcp connect failed: {0}")]
    TcpConnect(#[source] std::io::Error),
    #[error("tls handshake failed: {0}")]
    TlsHandshake(String),
    #[error("server rejected websocket upgrade with status {status}")]
    HandshakeRejected { status: u16 },
    #[error("server omitted or mismatched Sec-WebSocket-Accept")]
    HandshakeAcceptMismatch,
    #[error("connect timed out after {0}ms")]
    ConnectTimeout(u64),
    #[error("transport reset: {0}")]
    TransportReset(String),
    #[error("not connected")]
    NotConnected,
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed json: {0}")]
    MalformedJson(String),
    #[error("missing or invalid signature")]
    InvalidSignature,
    #[error("unknown message type {0:?}")]
    UnknownMessageType(String),
    #[error("unknown device {0:?}")]
    UnknownDevice(String),
    #[error("missing field {0:?}")]
    MissingField(&'static str),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("device {device_id:?} has no handler for action {action:?}")]
    UnknownAction { device_id: String, action: String },
    #[error("callback refused the request")]
    CallbackRefused,
}

#[derive(Debug, Error)]
pub enum OverflowKind {
    #[error("message queue is full")]
    QueueFull,
    #[error("message of {len} bytes exceeds the {max} byte slot cap")]
    MessageTooLarge { len: usize, max: usize },
    #[error("device table is full ({max} devices)")]
    DeviceTableFull { max: usize },
}
