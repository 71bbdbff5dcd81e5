//! PowerState capability: `setPowerState` request, no events of its own
//! (other capabilities derive power-on side effects from it — see
//! [`crate::device::Device`]).

use super::{Callback, CallbackOutcome};
use crate::error::{DispatchError, ProtocolError, SdkError};

pub const ACTION_SET_POWER_STATE: &str = "setPowerState";

pub struct PowerState {
    current: bool,
    on_set: Option<Callback<bool, bool>>,
}

impl PowerState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: false,
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
    pub fn current(&self) -> bool {
        self.current
    }

    /// Directly sets the cached state without invoking a callback. Used by
    /// derived-power-on side effects from sibling capabilities.
    pub fn set_current(&mut self, value: bool) {
        self.current = value;
    }

    pub fn handle_request(
        &mut self,
        action: &str,
        value: &serde_json::Value,
        device_id: &str,
    ) -> Result<(bool, serde_json::Value), SdkError> {
        if action != ACTION_SET_POWER_STATE {
            return Err(SdkError::Dispatch(DispatchError::UnknownAction {
                device_id: device_id.to_string(),
                action: action.to_string(),
            }));
        }
        let state_str = value
            .get("state")
            .and_then(serde_json::Value::as_str)
            .ok_or(SdkError::Protocol(ProtocolError::MissingField("state")))?;
        let requested = state_str.eq_ignore_ascii_case("on");

        let outcome = match self.on_set.as_mut() {
            Some(cb) => cb(requested),
            None => CallbackOutcome::ok(requested),
        };
        if outcome.success {
            self.current = outcome.value;
        }
        let out = serde_json::json!({ "state": if outcome.value { "On" } else { "Off" } });
        Ok((outcome.success, out))
    }
}

impl Default for PowerState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_request_turns_on_and_invokes_callback() {
        let mut cap = PowerState::new();
        let observed = std::sync::Arc::new(std::sync::Mutex::new(None));
        let observed_clone = observed.clone();
        cap.on_set(move |state| {
            *observed_clone.lock().unwrap() = Some(state);
            CallbackOutcome::ok(state)
        });
        let (success, value) = cap
            .handle_request(ACTION_SET_POWER_STATE, &serde_json::json!({"state": "On"}), "dev")
            .unwrap();
        assert!(success);
        assert_eq!(value, serde_json::json!({"state": "On"}));
        assert_eq!(*observed.lock().unwrap(), Some(true));
        assert!(cap.current());
    }

    #[test]
    fn unknown_action_is_rejected() {
        let mut cap = PowerState::new();
        let err = cap.handle_request("setBrightness", &serde_json::json!({}), "dev");
        assert!(err.is_err());
    }
}
