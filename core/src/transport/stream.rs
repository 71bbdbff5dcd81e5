//! The concrete network stream: plain TCP or TLS-over-TCP, picked once at
//! connect time by `Config::use_ssl`. `WsClient<S>` itself stays generic
//! over any `Read + Write` so tests can swap in an in-memory duplex; this
//! enum is what the SDK facade actually constructs for a live connection.

use crate::error::LinkError;
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

pub enum Transport {
    Plain(TcpStream),
    Tls(Box<rustls::StreamOwned<rustls::ClientConnection, TcpStream>>),
}

impl Transport {
    pub fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        match self {
            Transport::Plain(stream) => stream.set_nonblocking(nonblocking),
            Transport::Tls(stream) => stream.sock.set_nonblocking(nonblocking),
        }
    }
}

impl Read for Transport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Transport::Plain(stream) => stream.read(buf),
            Transport::Tls(stream) => stream.read(buf),
        }
    }
}

impl Write for Transport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Transport::Plain(stream) => stream.write(buf),
            Transport::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Transport::Plain(stream) => stream.flush(),
            Transport::Tls(stream) => stream.flush(),
        }
    }
}

/// Blocking DNS → TCP → (TLS) connect, bounded by `connect_timeout`. This
/// is the one permitted blocking operation in the whole core (`spec.md`
/// §5). Resolution uses `ToSocketAddrs`, which is itself a blocking
/// syscall on every target std supports — exactly the "DNS resolver"
/// collaborator the spec has the core drive directly rather than poll.
pub fn connect_blocking(
    host: &str,
    port: u16,
    use_ssl: bool,
    connect_timeout: Duration,
) -> Result<Transport, LinkError> {
    let addr = (host, port)
        .to_socket_addrs()
        .map_err(|e| LinkError::DnsResolution {
            host: host.to_string(),
            source: e,
        })?
        .next()
        .ok_or_else(|| LinkError::DnsResolution {
            host: host.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no addresses returned"),
        })?;

    let tcp = TcpStream::connect_timeout(&addr, connect_timeout).map_err(LinkError::TcpConnect)?;
    tcp.set_nodelay(true).map_err(LinkError::TcpConnect)?;

    if !use_ssl {
        return Ok(Transport::Plain(tcp));
    }

    let mut root_store = rustls::RootCertStore::empty();
    root_store.add_trust_anchors(webpki_roots::TLS_SERVER_ROOTS.iter().map(|anchor| {
        rustls::OwnedTrustAnchor::from_subject_spki_name_constraints(
            anchor.subject,
            anchor.spki,
            anchor.name_constraints,
        )
    }));
    let config = rustls::ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    let server_name = rustls::ServerName::try_from(host)
        .map_err(|_| LinkError::TlsHandshake(format!("invalid server name {host:?}")))?;
    let conn = rustls::ClientConnection::new(Arc::new(config), server_name)
        .map_err(|e| LinkError::TlsHandshake(e.to_string()))?;

    Ok(Transport::Tls(Box::new(rustls::StreamOwned::new(conn, tcp))))
}
