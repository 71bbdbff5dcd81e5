//! DoorController capability (garage doors, gates): `setMode` with
//! `{mode: "Open" | "Close"}`, echoed back verbatim on success.

use super::{Callback, CallbackOutcome};
use crate::error::{DispatchError, ProtocolError, SdkError};

pub const ACTION_SET_MODE: &str = "setMode";

pub struct DoorController {
    closed: bool,
    on_set: Option<Callback<bool, bool>>,
}

impl DoorController {
    #[must_use]
    pub fn new() -> Self {
        Self {
            closed: false,
            on_set: None,
        }
    }

    pub fn on_set<F>(&mut self, callback: F)
    where
        F: FnMut(bool) -> CallbackOutcome<bool> + Send + 'static,
    {
        self.on_set = Some(Box::new(callback));
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn handle_request(
        &mut self,
        action: &str,
        value: &serde_json::Value,
        device_id: &str,
    ) -> Result<(bool, serde_json::Value), SdkError> {
        if action != ACTION_SET_MODE {
            return Err(SdkError::Dispatch(DispatchError::UnknownAction {
                device_id: device_id.to_string(),
                action: action.to_string(),
            }));
        }
        let mode_str = value
            .get("mode")
            .and_then(serde_json::Value::as_str)
            .ok_or(SdkError::Protocol(ProtocolError::MissingField("mode")))?;
        let close_requested = mode_str == "Close";

        let outcome = match self.on_set.as_mut() {
            Some(cb) => cb(close_requested),
            None => CallbackOutcome::ok(close_requested),
        };
        if outcome.success {
            self.closed = outcome.value;
        }
        let out = serde_json::json!({ "mode": if outcome.value { "Close" } else { "Open" } });
        Ok((outcome.success, out))
    }
}

impl Default for DoorController {
    fn default() -> Self {
        Self::new()
    }
}
