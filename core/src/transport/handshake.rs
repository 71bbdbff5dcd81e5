//! HTTP Upgrade request builder, response parser, and `Sec-WebSocket-Accept`
//! verification — `spec.md` §4.4/§6.2.

use crate::crypto::Crypto;
use crate::error::LinkError;

/// The RFC 6455 magic GUID concatenated onto `Sec-WebSocket-Key` before
/// SHA-1 before the server echoes back `Sec-WebSocket-Accept`.
const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Builds the exact HTTP Upgrade request from `spec.md` §4.4, including the
/// vendor-specific `appkey`/`deviceids`/`restoredevicestates`/`platform`/
/// `SDKVersion` headers.
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn build_upgrade_request(
    host: &str,
    path: &str,
    key_base64: &str,
    app_key: &str,
    device_ids: &[String],
    platform: &str,
    sdk_version: &str,
) -> String {
    format!(
        "GET {path} HTTP/1.1\r\n\
         Host: {host}\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Key: {key_base64}\r\n\
         Sec-WebSocket-Version: 13\r\n\
         appkey: {app_key}\r\n\
         deviceids: {device_ids}\r\n\
         restoredevicestates: false\r\n\
         platform: {platform}\r\n\
         SDKVersion: {sdk_version}\r\n\
         \r\n",
        device_ids = device_ids.join(";"),
    )
}

/// The parsed bits of the handshake response this client cares about.
#[derive(Debug)]
pub struct HandshakeResponse {
    pub status: u16,
    pub accept: Option<String>,
}

/// Parses a buffered HTTP response up to and including the blank line that
/// terminates the header block. Returns `Ok(None)` if `\r\n\r\n` has not
/// yet arrived (caller should keep accumulating), matching the rx
/// accumulator model from `spec.md` §4.4's "Bounded buffers".
pub fn parse_response(buf: &[u8]) -> Result<Option<(HandshakeResponse, usize)>, LinkError> {
    let text = std::str::from_utf8(buf)
        .map_err(|_| LinkError::TransportReset("handshake response was not valid utf-8".to_string()))?;

    let Some(header_end) = text.find("\r\n\r\n") else {
        return Ok(None);
    };
    let header_block = &text[..header_end];
    let mut lines = header_block.split("\r\n");

    let status_line = lines
        .next()
        .ok_or_else(|| LinkError::TransportReset("empty handshake response".to_string()))?;
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| LinkError::TransportReset(format!("malformed status line {status_line:?}")))?;

    let mut accept = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("sec-websocket-accept") {
                accept = Some(value.trim().to_string());
            }
        }
    }

    Ok(Some((HandshakeResponse { status, accept }, header_end + 4)))
}

/// Computes the expected `Sec-WebSocket-Accept` value for a given
/// `Sec-WebSocket-Key`.
#[must_use]
pub fn expected_accept(crypto: &dyn Crypto, key_base64: &str) -> String {
    let concatenated = format!("{key_base64}{WS_GUID}");
    let digest = crypto.sha1(concatenated.as_bytes());
    crypto.base64_encode(&digest)
}

/// Validates a handshake response per `spec.md` §4.4: status line must
/// contain `101`, and `Sec-WebSocket-Accept` must match exactly.
pub fn validate(
    crypto: &dyn Crypto,
    response: &HandshakeResponse,
    key_base64: &str,
) -> Result<(), LinkError> {
    if response.status != 101 {
        return Err(LinkError::HandshakeRejected {
            status: response.status,
        });
    }
    let expected = expected_accept(crypto, key_base64);
    match &response.accept {
        Some(accept) if *accept == expected => Ok(()),
        _ => Err(LinkError::HandshakeAcceptMismatch),
    }
}
