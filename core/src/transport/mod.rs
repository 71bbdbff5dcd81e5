//! WebSocket transport: RFC 6455 frame codec, HTTP Upgrade handshake, the
//! per-connection session state machine, and the concrete TCP/TLS stream.
//! `spec.md` §4.4.

pub mod frame;
pub mod handshake;
pub mod session;
pub mod stream;

pub use session::{ConnectionPhase, SessionEvent, WsClient};
pub use stream::{connect_blocking, Transport};
