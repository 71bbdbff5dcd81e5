//! Brightness capability: `setBrightness` (absolute) and `adjustBrightness`
//! (delta), both clamped to `[0, 100]`.

use super::{clamp_percent, Callback, CallbackOutcome};
use crate::error::{DispatchError, ProtocolError, SdkError};

pub const ACTION_SET_BRIGHTNESS: &str = "setBrightness";
pub const ACTION_ADJUST_BRIGHTNESS: &str = "adjustBrightness";

pub struct Brightness {
    current: i64,
    on_set: Option<Callback<i64, i64>>,
    on_adjust: Option<Callback<i64, i64>>,
}

impl Brightness {
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
            ACTION_SET_BRIGHTNESS => {
                let requested = value
                    .get("brightness")
                    .and_then(serde_json::Value::as_i64)
                    .ok_or(SdkError::Protocol(ProtocolError::MissingField("brightness")))?;
                let clamped = clamp_percent(requested);
                let outcome = match self.on_set.as_mut() {
                    Some(cb) => cb(clamped),
                    None => CallbackOutcome::ok(clamped),
                };
                (outcome.success, clamp_percent(outcome.value))
            }
            ACTION_ADJUST_BRIGHTNESS => {
                let delta = value
                    .get("brightnessDelta")
                    .and_then(serde_json::Value::as_i64)
                    .ok_or(SdkError::Protocol(ProtocolError::MissingField("brightnessDelta")))?;
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
        Ok((success, serde_json::json!({ "brightness": absolute })))
    }
}

impl Default for Brightness {
    fn default() -> Self {
        Self::new()
    }
}

pub const ACTIONS: &[&str] = &[ACTION_SET_BRIGHTNESS, ACTION_ADJUST_BRIGHTNESS];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_clamps_above_range() {
        let mut cap = Brightness::new();
        let (success, value) = cap
            .handle_request(ACTION_SET_BRIGHTNESS, &serde_json::json!({"brightness": 150}), "dev")
            .unwrap();
        assert!(success);
        assert_eq!(value, serde_json::json!({"brightness": 100}));
    }

    #[test]
    fn adjust_without_callback_applies_delta_to_cached_value() {
        let mut cap = Brightness::new();
        cap.handle_request(ACTION_SET_BRIGHTNESS, &serde_json::json!({"brightness": 40}), "dev")
            .unwrap();
        let (success, value) = cap
            .handle_request(
                ACTION_ADJUST_BRIGHTNESS,
                &serde_json::json!({"brightnessDelta": 25}),
                "dev",
            )
            .unwrap();
        assert!(success);
        assert_eq!(value, serde_json::json!({"brightness": 65}));
        assert_eq!(cap.current(), 65);
    }

    #[test]
    fn adjust_with_callback_reports_callbacks_absolute_value() {
        let mut cap = Brightness::new();
        cap.on_adjust(|delta| CallbackOutcome::ok(50 + delta));
        let (_, value) = cap
            .handle_request(
                ACTION_ADJUST_BRIGHTNESS,
                &serde_json::json!({"brightnessDelta": 10}),
                "dev",
            )
            .unwrap();
        assert_eq!(value, serde_json::json!({"brightness": 60}));
    }
}
