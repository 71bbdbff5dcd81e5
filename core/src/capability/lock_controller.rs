//! LockController capability: `setLockState` with `{state: "lock" | "unlock"}`.
//! On success the response reports `{state: "LOCKED" | "UNLOCKED"}`; on
//! callback failure it reports `{state: "JAMMED"}` rather than echoing the
//! request (the one capability in the table whose failure path has a
//! dedicated wire value).

use super::{Callback, CallbackOutcome};
use crate::error::{DispatchError, ProtocolError, SdkError};

pub const ACTION_SET_LOCK_STATE: &str = "setLockState";

pub struct LockController {
    locked: bool,
    on_set: Option<Callback<bool, bool>>,
}

impl LockController {
    #[must_use]
    pub fn new() -> Self {
        Self {
            locked: false,
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
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn handle_request(
        &mut self,
        action: &str,
        value: &serde_json::Value,
        device_id: &str,
    ) -> Result<(bool, serde_json::Value), SdkError> {
        if action != ACTION_SET_LOCK_STATE {
            return Err(SdkError::Dispatch(DispatchError::UnknownAction {
                device_id: device_id.to_string(),
                action: action.to_string(),
            }));
        }
        let state_str = value
            .get("state")
            .and_then(serde_json::Value::as_str)
            .ok_or(SdkError::Protocol(ProtocolError::MissingField("state")))?;
        let lock_requested = state_str == "lock";

        let outcome = match self.on_set.as_mut() {
            Some(cb) => cb(lock_requested),
            None => CallbackOutcome::ok(lock_requested),
        };

        let out = if outcome.success {
            self.locked = outcome.value;
            serde_json::json!({ "state": if outcome.value { "LOCKED" } else { "UNLOCKED" } })
        } else {
            serde_json::json!({ "state": "JAMMED" })
        };
        Ok((outcome.success, out))
    }
}

impl Default for LockController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_jam_reports_jammed_and_leaves_success_false() {
        // Scenario S4.
        let mut cap = LockController::new();
        cap.on_set(|_| CallbackOutcome::refused(true));
        let (success, value) = cap
            .handle_request(ACTION_SET_LOCK_STATE, &serde_json::json!({"state": "lock"}), "dev")
            .unwrap();
        assert!(!success);
        assert_eq!(value, serde_json::json!({"state": "JAMMED"}));
        assert!(!cap.is_locked());
    }

    #[test]
    fn successful_lock_reports_locked() {
        let mut cap = LockController::new();
        let (success, value) = cap
            .handle_request(ACTION_SET_LOCK_STATE, &serde_json::json!({"state": "lock"}), "dev")
            .unwrap();
        assert!(success);
        assert_eq!(value, serde_json::json!({"state": "LOCKED"}));
        assert!(cap.is_locked());
    }
}
