//! PowerLevel capability: `setPowerLevel` (absolute) and `adjustPowerLevel`
//! (delta), clamped to `[0, 100]`. Structurally identical to
//! [`crate::capability::brightness`] — the original SDK's power-level and
//! brightness capabilities are near-duplicates of each other too.

use super::{clamp_percent, Callback, CallbackOutcome};
use crate::error::{DispatchError, ProtocolError, SdkError};

pub const ACTION_SET_POWER_LEVEL: &str = "setPowerLevel";
pub const ACTION_ADJUST_POWER_LEVEL: &str = "adjustPowerLevel";

pub struct PowerLevel {
    current: i64,
    on_set: Option<Callback<i64, i64>>,
    on_adjust: Option<Callback<i64, i64>>,
}

impl PowerLevel {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: 0,
            on_set: None,
            on_adjust: None,
        }
    }

    pub fn on_set<F>(&mut self, callback: F)
    where
        F: FnMut(i64) -> CallbackOutcome<i64> + Send + 'static,
    {
        self.on_set = Some(Box::new(callback));
    }

    pub fn on_adjust<F>(&mut self, callback: F)
    where
        F: FnMut(i64) -> CallbackOutcome<i64> + Send + 'static,
    {
        self.on_adjust = Some(Box::new(callback));
    }

    #[must_use]
    pub fn current(&self) -> i64 {
        self.current
    }

    pub fn handle_request(
        &mut self,
        action: &str,
        value: &serde_json::Value,
        device_id: &str,
    ) -> Result<(bool, serde_json::Value), SdkError> {
        let (success, absolute) = match action {
            ACTION_SET_POWER_LEVEL => {
                let requested = value
                    .get("powerLevel")
                    .and_then(serde_json::Value::as_i64)
                    .ok_or(SdkError::Protocol(ProtocolError::MissingField("powerLevel")))?;
                let clamped = clamp_percent(requested);
                let outcome = match self.on_set.as_mut() {
                    Some(cb) => cb(clamped),
                    None => CallbackOutcome::ok(clamped),
                };
                (outcome.success, clamp_percent(outcome.value))
            }
            ACTION_ADJUST_POWER_LEVEL => {
                let delta = value
                    .get("powerLevelDelta")
                    .and_then(serde_json::Value::as_i64)
                    .ok_or(SdkError::Protocol(ProtocolError::MissingField("powerLevelDelta")))?;
                match self.on_adjust.as_mut() {
                    Some(cb) => {
                        let outcome = cb(delta);
                        (outcome.success, clamp_percent(outcome.value))
                    }
                    None => (true, clamp_percent(self.current + delta)),
                }
            }
            _ => {
                return Err(SdkError::Dispatch(DispatchError::UnknownAction {
                    device_id: device_id.to_string(),
                    action: action.to_string(),
                }))
            }
        };
        if success {
            self.current = absolute;
        }
        Ok((success, serde_json::json!({ "powerLevel": absolute })))
    }
}

impl Default for PowerLevel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjust_without_callback_applies_delta() {
        let mut cap = PowerLevel::new();
        cap.handle_request(ACTION_SET_POWER_LEVEL, &serde_json::json!({"powerLevel": 30}), "dev")
            .unwrap();
        let (_, value) = cap
            .handle_request(
                ACTION_ADJUST_POWER_LEVEL,
                &serde_json::json!({"powerLevelDelta": -10}),
                "dev",
            )
            .unwrap();
        assert_eq!(value, serde_json::json!({"powerLevel": 20}));
    }
}
