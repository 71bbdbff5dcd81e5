//! Device composition: one concrete struct holding an `Option<_>` per
//! capability family, built by [`DeviceBuilder`] and dispatched by name
//! via a small lookup rather than a long `if action == "..."` chain
//! (the original's per-device action-string chain, e.g. `sinricpro_light_t`'s
//! `process_request`, is replaced here).

use crate::capability::{
    air_quality_sensor::AirQualitySensor,
    brightness::{self, Brightness},
    color::{self, Color},
    color_temperature::{self, ColorTemperature},
    contact_sensor::ContactSensor,
    door_controller::{self, DoorController},
    doorbell::Doorbell,
    lock_controller::{self, LockController},
    motion_sensor::MotionSensor,
    power_level::{self, PowerLevel},
    power_sensor::PowerSensor,
    power_state::{self, PowerState},
    range_controller::{self, RangeController},
    temperature_sensor::TemperatureSensor,
};
use crate::error::{DispatchError, SdkError};
use crate::json::is_valid_device_id;

pub type DeviceId = String;

/// Broad product category, carried for diagnostics only — dispatch is
/// driven entirely by which capability fields are populated, not by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Light,
    Switch,
    Thermostat,
    GarageDoor,
    Lock,
    Doorbell,
    ContactSensor,
    MotionSensor,
    TemperatureSensor,
    PowerSensor,
    AirQualitySensor,
    Outlet,
    Fan,
    Other,
}

/// A composed device: each field is `Some` only when the device exposes
/// that capability. Devices own their capabilities by value — there is no
/// trait object here, since a device's capability set never changes after
/// construction and the whole point of the composition is static,
/// inspectable structure rather than runtime polymorphism.
pub struct Device {
    id: DeviceId,
    kind: DeviceKind,
    pub power_state: Option<PowerState>,
    pub brightness: Option<Brightness>,
    pub color: Option<Color>,
    pub color_temperature: Option<ColorTemperature>,
    pub power_level: Option<PowerLevel>,
    pub range: Option<RangeController>,
    pub door: Option<DoorController>,
    pub lock: Option<LockController>,
    pub doorbell: Option<Doorbell>,
    pub contact: Option<ContactSensor>,
    pub motion: Option<MotionSensor>,
    pub temperature: Option<TemperatureSensor>,
    pub power_sensor: Option<PowerSensor>,
    pub air_quality: Option<AirQualitySensor>,
}

/// Action names that, when handled successfully, imply the device's power
/// should be considered on — mirrors the original SDK's convention that
/// setting brightness, color, or color temperature on a light also turns
/// it on.
fn implies_power_on(action: &str) -> bool {
    matches!(
        action,
        brightness::ACTION_SET_BRIGHTNESS
            | brightness::ACTION_ADJUST_BRIGHTNESS
            | color::ACTION_SET_COLOR
            | color_temperature::ACTION_SET_COLOR_TEMPERATURE
            | color_temperature::ACTION_INCREASE_COLOR_TEMPERATURE
            | color_temperature::ACTION_DECREASE_COLOR_TEMPERATURE
    )
}

impl Device {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// Dispatches one inbound request action to whichever capability
    /// declares it, trying each populated capability's `handle_request` in
    /// turn rather than a hand-written `if action == "..."` chain per
    /// device type.
    pub fn handle_request(&mut self, action: &str, value: &serde_json::Value) -> Result<(bool, serde_json::Value), SdkError> {
        macro_rules! try_capability {
            ($field:expr) => {
                if let Some(cap) = $field.as_mut() {
                    match cap.handle_request(action, value, &self.id) {
                        Ok(outcome) => return Ok(outcome),
                        Err(SdkError::Dispatch(DispatchError::UnknownAction { .. })) => {}
                        Err(other) => return Err(other),
                    }
                }
            };
        }

        try_capability!(self.power_state);
        try_capability!(self.brightness);
        try_capability!(self.color);
        try_capability!(self.color_temperature);
        try_capability!(self.power_level);
        try_capability!(self.range);
        try_capability!(self.door);
        try_capability!(self.lock);

        Err(SdkError::Dispatch(DispatchError::UnknownAction {
            device_id: self.id.clone(),
            action: action.to_string(),
        }))
    }

    /// Like [`Device::handle_request`], but also applies the derived
    /// power-on side effect: if the action succeeded and implies power-on,
    /// and the device has a power state capability, it is forced on.
    pub fn handle_request_with_side_effects(
        &mut self,
        action: &str,
        value: &serde_json::Value,
    ) -> Result<(bool, serde_json::Value), SdkError> {
        let outcome = self.handle_request(action, value)?;
        if outcome.0 && implies_power_on(action) {
            if let Some(power) = self.power_state.as_mut() {
                power.set_current(true);
            }
        }
        Ok(outcome)
    }
}

/// Builds a [`Device`] by composing whichever capabilities the caller
/// requests. Mirrors the original's per-product-type composition (e.g. a
/// `sinricpro_light_t` embeds a power state, a brightness, a color, and a
/// color temperature struct), generalized to any combination.
pub struct DeviceBuilder {
    id: DeviceId,
    kind: DeviceKind,
    power_state: Option<PowerState>,
    brightness: Option<Brightness>,
    color: Option<Color>,
    color_temperature: Option<ColorTemperature>,
    power_level: Option<PowerLevel>,
    range: Option<RangeController>,
    door: Option<DoorController>,
    lock: Option<LockController>,
    doorbell: Option<Doorbell>,
    contact: Option<ContactSensor>,
    motion: Option<MotionSensor>,
    temperature: Option<TemperatureSensor>,
    power_sensor: Option<PowerSensor>,
    air_quality: Option<AirQualitySensor>,
}

impl DeviceBuilder {
    pub fn new(id: impl Into<String>, kind: DeviceKind) -> Result<Self, SdkError> {
        let id = id.into();
        if !is_valid_device_id(&id) {
            return Err(SdkError::Config(crate::error::ConfigError::InvalidDeviceId(id)));
        }
        Ok(Self {
            id,
            kind,
            power_state: None,
            brightness: None,
            color: None,
            color_temperature: None,
            power_level: None,
            range: None,
            door: None,
            lock: None,
            doorbell: None,
            contact: None,
            motion: None,
            temperature: None,
            power_sensor: None,
            air_quality: None,
        })
    }

    #[must_use]
    pub fn with_power_state(mut self) -> Self {
        self.power_state = Some(PowerState::new());
        self
    }

    #[must_use]
    pub fn with_brightness(mut self) -> Self {
        self.brightness = Some(Brightness::new());
        self
    }

    #[must_use]
    pub fn with_color(mut self) -> Self {
        self.color = Some(Color::new());
        self
    }

    #[must_use]
    pub fn with_color_temperature(mut self) -> Self {
        self.color_temperature = Some(ColorTemperature::new());
        self
    }

    #[must_use]
    pub fn with_power_level(mut self) -> Self {
        self.power_level = Some(PowerLevel::new());
        self
    }

    #[must_use]
    pub fn with_range(mut self) -> Self {
        self.range = Some(RangeController::new());
        self
    }

    #[must_use]
    pub fn with_door(mut self) -> Self {
        self.door = Some(DoorController::new());
        self
    }

    #[must_use]
    pub fn with_lock(mut self) -> Self {
        self.lock = Some(LockController::new());
        self
    }

    #[must_use]
    pub fn with_doorbell(mut self) -> Self {
        self.doorbell = Some(Doorbell::new());
        self
    }

    #[must_use]
    pub fn with_contact_sensor(mut self) -> Self {
        self.contact = Some(ContactSensor::new());
        self
    }

    #[must_use]
    pub fn with_motion_sensor(mut self) -> Self {
        self.motion = Some(MotionSensor::new());
        self
    }

    #[must_use]
    pub fn with_temperature_sensor(mut self) -> Self {
        self.temperature = Some(TemperatureSensor::new());
        self
    }

    #[must_use]
    pub fn with_power_sensor(mut self) -> Self {
        self.power_sensor = Some(PowerSensor::new());
        self
    }

    #[must_use]
    pub fn with_air_quality_sensor(mut self) -> Self {
        self.air_quality = Some(AirQualitySensor::new());
        self
    }

    #[must_use]
    pub fn build(self) -> Device {
        Device {
            id: self.id,
            kind: self.kind,
            power_state: self.power_state,
            brightness: self.brightness,
            color: self.color,
            color_temperature: self.color_temperature,
            power_level: self.power_level,
            range: self.range,
            door: self.door,
            lock: self.lock,
            doorbell: self.doorbell,
            contact: self.contact,
            motion: self.motion,
            temperature: self.temperature,
            power_sensor: self.power_sensor,
            air_quality: self.air_quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light(id: &str) -> Device {
        DeviceBuilder::new(id, DeviceKind::Light)
            .unwrap()
            .with_power_state()
            .with_brightness()
            .build()
    }

    #[test]
    fn rejects_malformed_device_id() {
        assert!(DeviceBuilder::new("not-hex", DeviceKind::Light).is_err());
    }

    #[test]
    fn unknown_action_is_rejected() {
        let mut device = light("aaaaaaaaaaaaaaaaaaaaaaaa");
        let err = device.handle_request("setColor", &serde_json::json!({})).unwrap_err();
        assert!(matches!(err, SdkError::Dispatch(DispatchError::UnknownAction { .. })));
    }

    #[test]
    fn setting_brightness_turns_power_on() {
        let mut device = light("aaaaaaaaaaaaaaaaaaaaaaaa");
        device
            .handle_request(power_state::ACTION_SET_POWER_STATE, &serde_json::json!({"state": "Off"}))
            .unwrap();
        assert!(!device.power_state.as_ref().unwrap().current());

        let (success, _) = device
            .handle_request_with_side_effects("setBrightness", &serde_json::json!({"brightness": 50}))
            .unwrap();
        assert!(success);
        assert!(device.power_state.as_ref().unwrap().current());
    }
}
