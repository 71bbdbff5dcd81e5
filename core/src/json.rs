//! Envelope types and the canonical-payload slice extractor.
//!
//! Every message exchanged with the cloud is a JSON object with exactly
//! three top-level members, serialized in a fixed key order
//! (`header`, `payload`, `signature`) with no insignificant whitespace —
//! both properties fall out of `#[derive(Serialize)]` on a plain struct
//! (field order is declaration order) plus `serde_json::to_string`'s
//! default compact formatting, so no custom serializer is needed.

use crate::error::{ProtocolError, SdkError};
use serde::{Deserialize, Serialize};

pub const PAYLOAD_VERSION: u32 = 2;
pub const SIGNATURE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    #[serde(rename = "payloadVersion")]
    pub payload_version: u32,
    #[serde(rename = "signatureVersion")]
    pub signature_version: u32,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            payload_version: PAYLOAD_VERSION,
            signature_version: SIGNATURE_VERSION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Request,
    Response,
    Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventCause {
    PhysicalInteraction,
    PeriodicPoll,
    Alert,
}

impl Default for EventCause {
    fn default() -> Self {
        Self::PhysicalInteraction
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cause {
    #[serde(rename = "type")]
    pub kind: EventCause,
}

impl Default for Cause {
    fn default() -> Self {
        Self {
            kind: EventCause::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub action: String,
    pub device_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Cause>,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(rename = "HMAC")]
    pub hmac: String,
}

/// The three-member envelope, field order fixed by declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub header: Header,
    pub payload: Payload,
    pub signature: Signature,
}

impl Envelope {
    /// Serializes with no insignificant whitespace, the form both the
    /// signer and the canonical-slice extractor operate on.
    pub fn to_canonical_json(&self) -> Result<String, SdkError> {
        serde_json::to_string(self)
            .map_err(|e| SdkError::Protocol(ProtocolError::MalformedJson(e.to_string())))
    }

    pub fn from_canonical_json(raw: &str) -> Result<Self, SdkError> {
        serde_json::from_str(raw)
            .map_err(|e| SdkError::Protocol(ProtocolError::MalformedJson(e.to_string())))
    }
}

/// Builds a response `Payload` pre-populated from an inbound request, per
/// the dispatcher's step 5: same `action`/`clientId`/`deviceId`/`replyToken`,
/// a fresh `message` uuid, `success = false` until the handler overwrites it.
#[must_use]
pub fn response_payload_from(request: &Payload, now_epoch_s: i64, message_id: String) -> Payload {
    Payload {
        kind: MessageType::Response,
        action: request.action.clone(),
        device_id: request.device_id.clone(),
        client_id: request.client_id.clone(),
        reply_token: request.reply_token.clone(),
        message: Some(message_id),
        created_at: now_epoch_s,
        success: Some(false),
        cause: None,
        value: serde_json::Value::Object(serde_json::Map::new()),
    }
}

#[must_use]
pub fn event_payload(
    device_id: &str,
    action: &str,
    cause: EventCause,
    value: serde_json::Value,
    now_epoch_s: i64,
    message_id: String,
) -> Payload {
    Payload {
        kind: MessageType::Event,
        action: action.to_string(),
        device_id: device_id.to_string(),
        client_id: None,
        reply_token: Some(message_id.clone()),
        message: Some(message_id),
        created_at: now_epoch_s,
        success: None,
        cause: Some(Cause { kind: cause }),
        value,
    }
}

/// Extracts the canonical payload slice: the exact byte range between the
/// literal `"payload":` marker and the literal `,"signature"` marker.
///
/// Both the signer and verifier use this so they agree on exactly what was
/// signed without re-parsing into a `Value` (which would not preserve the
/// original byte-for-byte representation).
pub fn canonical_payload_slice(serialized_envelope: &str) -> Result<&str, SdkError> {
    const PAYLOAD_MARKER: &str = "\"payload\":";
    const SIGNATURE_MARKER: &str = ",\"signature\"";

    let payload_start = serialized_envelope
        .find(PAYLOAD_MARKER)
        .ok_or_else(|| SdkError::Protocol(ProtocolError::MissingField("payload")))?
        + PAYLOAD_MARKER.len();

    let signature_start = serialized_envelope[payload_start..]
        .find(SIGNATURE_MARKER)
        .ok_or_else(|| SdkError::Protocol(ProtocolError::MissingField("signature")))?
        + payload_start;

    if signature_start < payload_start {
        return Err(SdkError::Protocol(ProtocolError::MalformedJson(
            "signature marker precedes payload marker".to_string(),
        )));
    }

    Ok(&serialized_envelope[payload_start..signature_start])
}

#[must_use]
pub fn is_valid_device_id(id: &str) -> bool {
    id.len() == 24 && id.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_envelope() -> Envelope {
        Envelope {
            header: Header::default(),
            payload: Payload {
                kind: MessageType::Request,
                action: "setPowerState".to_string(),
                device_id: "aaaaaaaaaaaaaaaaaaaaaaaa".to_string(),
                client_id: None,
                reply_token: Some("rt-1".to_string()),
                message: Some("m-1".to_string()),
                created_at: 1_700_000_000,
                success: None,
                cause: None,
                value: serde_json::json!({"state": "On"}),
            },
            signature: Signature {
                hmac: "deadbeef".to_string(),
            },
        }
    }

    #[test]
    fn serializes_with_fixed_key_order_and_no_whitespace() {
        let json = sample_envelope().to_canonical_json().unwrap();
        assert!(json.starts_with("{\"header\":"));
        let payload_idx = json.find("\"payload\":").unwrap();
        let signature_idx = json.find("\"signature\":").unwrap();
        assert!(payload_idx < signature_idx);
        assert!(!json.contains(' '));
        assert!(!json.contains('\n'));
    }

    #[test]
    fn canonical_slice_excludes_header_and_signature() {
        let json = sample_envelope().to_canonical_json().unwrap();
        let slice = canonical_payload_slice(&json).unwrap();
        assert!(slice.starts_with("{\"type\":"));
        assert!(!slice.contains("signature"));
        assert!(!slice.contains("payloadVersion"));
    }

    #[test]
    fn device_id_validation() {
        assert!(is_valid_device_id("aaaaaaaaaaaaaaaaaaaaaaaa"));
        assert!(!is_valid_device_id("too-short"));
        assert!(!is_valid_device_id("zzzzzzzzzzzzzzzzzzzzzzzz"));
    }
}
