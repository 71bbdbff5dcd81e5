//! Device SDK core: capability composition, request dispatch, message
//! signing, and the WebSocket link to the cloud.
//!
//! This crate is transport-generic at its seams (`Clock`, `Rng`, `Crypto`,
//! and the `WsClient<S: Read + Write>` stream parameter) so the same
//! dispatch and capability logic exercised here runs unmodified against a
//! real `Transport` or an in-memory stream in tests.

pub mod capability;
pub mod clock;
pub mod crypto;
pub mod device;
pub mod dispatcher;
pub mod error;
pub mod json;
pub mod limiter;
pub mod queue;
pub mod registry;
pub mod sdk;
pub mod signature;
pub mod transport;

pub use device::{Device, DeviceBuilder, DeviceId, DeviceKind};
pub use error::{ConfigError, DispatchError, LinkError, OverflowKind, ProtocolError, SdkError};
pub use sdk::{Config, Sdk, SdkState, PLATFORM_ID, SDK_VERSION};
pub use transport::Transport;

/// Initializes tracing with a plain human-readable formatter, honoring
/// `RUST_LOG` if set and otherwise defaulting to `info` for `service_name`.
pub fn init_tracing(service_name: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{service_name}=info")));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Initializes tracing with JSON output, for hosts that ship logs to a
/// structured sink.
pub fn init_tracing_json(service_name: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{service_name}=info")));

    tracing_subscriber::fmt().with_env_filter(filter).json().init();
}
