//! Color capability: `setColor`, an RGB triple clamped to `[0, 255]` per
//! channel (the original relied on C's implicit `uint8_t` truncation on
//! cast; JSON numbers carry no such bound, so clamping is explicit here).

use super::{clamp_color_channel, Callback, CallbackOutcome};
use crate::error::{DispatchError, ProtocolError, SdkError};

pub const ACTION_SET_COLOR: &str = "setColor";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

pub struct Color {
    current: Rgb,
    on_set: Option<Callback<Rgb, Rgb>>,
}

impl Color {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: Rgb::default(),
            on_set: None,
        }
    }

    pub fn on_set<F>(&mut self, callback: F)
    where
        F: FnMut(Rgb) -> CallbackOutcome<Rgb> + Send + 'static,
    {
        self.on_set = Some(Box::new(callback));
    }

    #[must_use]
    pub fn current(&self) -> Rgb {
        self.current
    }

    pub fn handle_request(
        &mut self,
        action: &str,
        value: &serde_json::Value,
        device_id: &str,
    ) -> Result<(bool, serde_json::Value), SdkError> {
        if action != ACTION_SET_COLOR {
            return Err(SdkError::Dispatch(DispatchError::UnknownAction {
                device_id: device_id.to_string(),
                action: action.to_string(),
            }));
        }
        let color = value
            .get("color")
            .ok_or(SdkError::Protocol(ProtocolError::MissingField("color")))?;
        let field = |name: &'static str| -> Result<i64, SdkError> {
            color
                .get(name)
                .and_then(serde_json::Value::as_i64)
                .ok_or(SdkError::Protocol(ProtocolError::MissingField(name)))
        };
        let requested = Rgb {
            r: clamp_color_channel(field("r")?),
            g: clamp_color_channel(field("g")?),
            b: clamp_color_channel(field("b")?),
        };
        let outcome = match self.on_set.as_mut() {
            Some(cb) => cb(requested),
            None => CallbackOutcome::ok(requested),
        };
        if outcome.success {
            self.current = outcome.value;
        }
        let out = serde_json::json!({
            "color": {
                "r": outcome.value.r,
                "g": outcome.value.g,
                "b": outcome.value.b,
            }
        });
        Ok((outcome.success, out))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new()
    }
}
