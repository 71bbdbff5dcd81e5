//! Capability modules: one per row of the capability table, each owning
//! its cached state, callbacks, and (where applicable) an [`EventLimiter`].
//!
//! Callbacks replace the original SDK's function-pointer-plus-out-parameter
//! idiom: a callback takes the request's input value (absolute or delta,
//! depending on the action) and returns a [`CallbackOutcome`] carrying
//! success plus the new absolute value, rather than mutating a pointer.

pub mod air_quality_sensor;
pub mod brightness;
pub mod color;
pub mod color_temperature;
pub mod contact_sensor;
pub mod door_controller;
pub mod doorbell;
pub mod lock_controller;
pub mod motion_sensor;
pub mod power_level;
pub mod power_sensor;
pub mod power_state;
pub mod range_controller;
pub mod temperature_sensor;

use crate::limiter::EventLimiter;

/// Result of invoking a user callback: did the device accept the request,
/// and what is the resulting absolute value (clamped by the caller before
/// this is constructed, per capability clamping rules).
#[derive(Debug, Clone, Copy)]
pub struct CallbackOutcome<T> {
    pub success: bool,
    pub value: T,
}

impl<T> CallbackOutcome<T> {
    #[must_use]
    pub fn ok(value: T) -> Self {
        Self {
            success: true,
            value,
        }
    }

    #[must_use]
    pub fn refused(value: T) -> Self {
        Self {
            success: false,
            value,
        }
    }
}

/// A user-supplied handler invoked from within `handle()`. Boxed because
/// devices are composed at runtime and each capability's callback closes
/// over device-specific state (GPIO handles, etc.) that the core never
/// sees.
pub type Callback<I, O> = Box<dyn FnMut(I) -> CallbackOutcome<O> + Send>;

#[must_use]
pub fn clamp_u8_range(value: i64, min: i64, max: i64) -> i64 {
    value.clamp(min, max)
}

#[must_use]
pub fn clamp_percent(value: i64) -> i64 {
    clamp_u8_range(value, 0, 100)
}

#[must_use]
pub fn clamp_color_temperature(value: i64) -> i64 {
    clamp_u8_range(value, 2200, 7000)
}

#[must_use]
pub fn clamp_color_channel(value: i64) -> u8 {
    value.clamp(0, 255) as u8
}

/// Shared constructor for the two sensor/state limiter presets, so every
/// capability module asks for "a state limiter" or "a sensor limiter"
/// rather than repeating the millisecond constants.
#[must_use]
pub fn new_state_limiter() -> EventLimiter {
    EventLimiter::for_state()
}

#[must_use]
pub fn new_sensor_limiter() -> EventLimiter {
    EventLimiter::for_sensor()
}
