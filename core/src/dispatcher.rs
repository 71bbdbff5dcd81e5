//! Request dispatcher: `spec.md` §4.6 steps 1–7, verbatim. Parses an
//! inbound raw message, verifies its signature against the *received*
//! bytes (not a re-serialization — the canonical slice is defined over
//! whatever bytes actually arrived on the wire), looks up the device,
//! invokes its handler, and signs the resulting response.

use crate::clock::Clock;
use crate::crypto::Crypto;
use crate::json::{self, Envelope, MessageType};
use crate::queue::MAX_MESSAGE_BYTES;
use crate::registry::DeviceRegistry;
use crate::signature;

/// Outcome of dispatching one inbound message. `None` variants correspond
/// to the drop-and-log paths in `spec.md` §4.6 (malformed JSON, bad
/// signature, non-request type, unknown device) — none of these produce
/// an outbound message.
pub enum DispatchOutcome {
    /// A response envelope, already signed, ready to enqueue on tx.
    Respond(Envelope),
    /// The message was a server `response` or `event` echo — accepted,
    /// not acted on (`spec.md` §4.6 step 3).
    Noop,
    /// Dropped: malformed JSON, invalid signature, or unknown device.
    Dropped(&'static str),
}

/// Dispatches one inbound raw message against `registry`.
///
/// `raw` is the exact bytes received from the transport (step 2 depends on
/// byte-for-byte fidelity with what the server signed).
pub fn dispatch(
    raw: &[u8],
    registry: &mut DeviceRegistry<'_>,
    crypto: &dyn Crypto,
    clock: &dyn Clock,
    app_secret: &str,
) -> DispatchOutcome {
    let Ok(text) = std::str::from_utf8(raw) else {
        tracing::warn!("dropping inbound message: not valid utf-8");
        return DispatchOutcome::Dropped("not utf-8");
    };

    // Step 1: parse JSON; fail silently (logged) on malformed input.
    let envelope = match Envelope::from_canonical_json(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(error = %e, "dropping inbound message: malformed json");
            return DispatchOutcome::Dropped("malformed json");
        }
    };

    // Step 2: verify signature against the received bytes.
    if !signature::verify(crypto, app_secret, text, &envelope.signature.hmac, MAX_MESSAGE_BYTES) {
        tracing::warn!(
            device_id = envelope.payload.device_id,
            action = envelope.payload.action,
            "dropping inbound message: signature verification failed"
        );
        return DispatchOutcome::Dropped("invalid signature");
    }

    // Step 3: only "request" is dispatched.
    if envelope.payload.kind != MessageType::Request {
        return DispatchOutcome::Noop;
    }

    // Step 4: look up the device.
    let device_id = envelope.payload.device_id.clone();
    let Some(device) = registry.find_device_mut(&device_id) else {
        tracing::warn!(device_id, "dropping request: unknown device");
        return DispatchOutcome::Dropped("unknown device");
    };

    // Step 5: pre-populate the response envelope from the request.
    let message_id = uuid::Uuid::new_v4().to_string();
    let mut response_payload =
        json::response_payload_from(&envelope.payload, clock.epoch_seconds(), message_id);

    // Step 6: dispatch by action to exactly one capability.
    let outcome = device.handle_request_with_side_effects(&envelope.payload.action, &envelope.payload.value);

    // Step 7: overwrite success, fill value, sign.
    let (success, value) = match outcome {
        Ok((success, value)) => (success, value),
        Err(e) => {
            tracing::warn!(device_id, action = envelope.payload.action, error = %e, "request handling failed");
            (false, serde_json::Value::Object(serde_json::Map::new()))
        }
    };
    response_payload.success = Some(success);
    response_payload.value = value;

    let response = Envelope {
        header: envelope.header,
        payload: response_payload,
        signature: crate::json::Signature {
            hmac: String::new(),
        },
    };
    match sign_envelope(crypto, app_secret, response) {
        Ok(signed) => DispatchOutcome::Respond(signed),
        Err(e) => {
            tracing::error!(error = %e, "failed to sign response envelope");
            DispatchOutcome::Dropped("signing failure")
        }
    }
}

/// Serializes `envelope` once to compute its canonical payload slice,
/// signs that slice, then re-serializes with the signature populated.
fn sign_envelope(
    crypto: &dyn Crypto,
    app_secret: &str,
    mut envelope: Envelope,
) -> Result<Envelope, crate::error::SdkError> {
    let unsigned = envelope.to_canonical_json()?;
    let hmac = signature::sign(crypto, app_secret, &unsigned)?;
    envelope.signature.hmac = hmac;
    Ok(envelope)
}
