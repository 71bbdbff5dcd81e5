//! ColorTemperature capability: `setColorTemperature` (absolute, Kelvin)
//! plus `increaseColorTemperature`/`decreaseColorTemperature`, which carry
//! no request value — the original signaled direction with a `+1`/`-1`
//! sentinel delta; here that becomes an explicit, named step constant.
//! All three clamp to `[2200, 7000]`.

use super::{clamp_color_temperature, Callback, CallbackOutcome};
use crate::error::{DispatchError, ProtocolError, SdkError};

pub const ACTION_SET_COLOR_TEMPERATURE: &str = "setColorTemperature";
pub const ACTION_INCREASE_COLOR_TEMPERATURE: &str = "increaseColorTemperature";
pub const ACTION_DECREASE_COLOR_TEMPERATURE: &str = "decreaseColorTemperature";

/// Kelvin step applied by increase/decrease when no adjust callback is
/// installed. The original SDK used a raw `+1`/`-1` sentinel as the delta
/// passed to the callback, which made sense only because the callback was
/// expected to replace it with an absolute value; a fallback step of 1K is
/// not a useful default for a real light, so a coarser, documented step is
/// used instead (see DESIGN.md).
pub const DEFAULT_STEP_K: i64 = 100;

const DEFAULT_COLOR_TEMP_K: i64 = 2700;

pub struct ColorTemperature {
    current: i64,
    on_set: Option<Callback<i64, i64>>,
    on_increase: Option<Callback<i64, i64>>,
    on_decrease: Option<Callback<i64, i64>>,
}

impl ColorTemperature {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: DEFAULT_COLOR_TEMP_K,
            on_set: None,
            on_increase: None,
            on_decrease: None,
        }
    }

    pub fn on_set<F>(&mut self, callback: F)
    where
        F: FnMut(i64) -> CallbackOutcome<i64> + Send + 'static,
    {
        self.on_set = Some(Box::new(callback));
    }

    pub fn on_increase<F>(&mut self, callback: F)
    where
        F: FnMut(i64) -> CallbackOutcome<i64> + Send + 'static,
    {
        self.on_increase = Some(Box::new(callback));
    }

    pub fn on_decrease<F>(&mut self, callback: F)
    where
        F: FnMut(i64) -> CallbackOutcome<i64> + Send + 'static,
    {
        self.on_decrease = Some(Box::new(callback));
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
            ACTION_SET_COLOR_TEMPERATURE => {
                let requested = value
                    .get("colorTemperature")
                    .and_then(serde_json::Value::as_i64)
                    .ok_or(SdkError::Protocol(ProtocolError::MissingField("colorTemperature")))?;
                let clamped = clamp_color_temperature(requested);
                let outcome = match self.on_set.as_mut() {
                    Some(cb) => cb(clamped),
                    None => CallbackOutcome::ok(clamped),
                };
                (outcome.success, clamp_color_temperature(outcome.value))
            }
            ACTION_INCREASE_COLOR_TEMPERATURE => self.adjust(DEFAULT_STEP_K),
            ACTION_DECREASE_COLOR_TEMPERATURE => self.adjust(-DEFAULT_STEP_K),
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
        Ok((success, serde_json::json!({ "colorTemperature": absolute })))
    }

    fn adjust(&mut self, delta: i64) -> (bool, i64) {
        let callback = if delta >= 0 {
            self.on_increase.as_mut()
        } else {
            self.on_decrease.as_mut()
        };
        match callback {
            Some(cb) => {
                let outcome = cb(delta);
                (outcome.success, clamp_color_temperature(outcome.value))
            }
            None => (true, clamp_color_temperature(self.current + delta)),
        }
    }
}

impl Default for ColorTemperature {
    fn default() -> Self {
        Self::new()
    }
}
