//! TemperatureSensor capability: event-only, `currentTemperature` →
//! `{temperature, humidity}`. Sensor-limiter preset (60s).

use crate::limiter::{new_sensor_limiter, EventLimiter, Gate};

pub const ACTION_CURRENT_TEMPERATURE: &str = "currentTemperature";

pub struct TemperatureSensor {
    temperature: f64,
    humidity: f64,
    limiter: EventLimiter,
}

impl TemperatureSensor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            temperature: 0.0,
            humidity: 0.0,
            limiter: new_sensor_limiter(),
        }
    }

    #[must_use]
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    #[must_use]
    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    /// Scenario S5: a second call inside the same 60s window is rate
    /// limited; the window resets afterward.
    pub fn try_emit(&mut self, now_ms: u64, temperature: f64, humidity: f64) -> Option<serde_json::Value> {
        match self.limiter.check(now_ms) {
            Gate::Allow => {
                self.temperature = temperature;
                self.humidity = humidity;
                Some(serde_json::json!({ "temperature": temperature, "humidity": humidity }))
            }
            Gate::Block => None,
        }
    }
}

impl Default for TemperatureSensor {
    fn default() -> Self {
        Self::new()
    }
}
