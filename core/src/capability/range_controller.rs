//! RangeController capability (blinds, fan speed, …): `setRangeValue`
//! (absolute) and `adjustRangeValue` (delta), clamped to `[0, 100]`.

use super::{clamp_percent, Callback, CallbackOutcome};
use crate::error::{DispatchError, ProtocolError, SdkError};

pub const ACTION_SET_RANGE_VALUE: &str = "setRangeValue";
pub const ACTION_ADJUST_RANGE_VALUE: &str = "adjustRangeValue";

pub struct RangeController {
    current: i64,
    on_set: Option<Callback<i64, i64>>,
    on_adjust: Option<Callback<i64, i64>>,
}

impl RangeController {
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
            ACTION_SET_RANGE_VALUE => {
                let requested = value
                    .get("rangeValue")
                    .and_then(serde_json::Value::as_i64)
                    .ok_or(SdkError::Protocol(ProtocolError::MissingField("rangeValue")))?;
                let clamped = clamp_percent(requested);
                let outcome = match self.on_set.as_mut() {
                    Some(cb) => cb(clamped),
                    None => CallbackOutcome::ok(clamped),
                };
                (outcome.success, clamp_percent(outcome.value))
            }
            ACTION_ADJUST_RANGE_VALUE => {
                let delta = value
                    .get("rangeValueDelta")
                    .and_then(serde_json::Value::as_i64)
                    .ok_or(SdkError::Protocol(ProtocolError::MissingField("rangeValueDelta")))?;
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
        Ok((success, serde_json::json!({ "rangeValue": absolute })))
    }
}

impl Default for RangeController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_clamps_to_percent_range() {
        let mut cap = RangeController::new();
        let (success, value) = cap
            .handle_request(ACTION_SET_RANGE_VALUE, &serde_json::json!({"rangeValue": -20}), "dev")
            .unwrap();
        assert!(success);
        assert_eq!(value, serde_json::json!({"rangeValue": 0}));
    }
}
