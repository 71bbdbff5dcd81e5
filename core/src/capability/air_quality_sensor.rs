//! AirQualitySensor capability: event-only, `airQuality` →
//! `{pm1, pm2_5, pm10}`. Sensor-limiter preset (60s), same grouping as
//! TemperatureSensor and PowerSensor — a periodic reading, not a
//! toggle-like burst.

use crate::limiter::{new_sensor_limiter, EventLimiter, Gate};

pub const ACTION_AIR_QUALITY: &str = "airQuality";

pub struct AirQualitySensor {
    pm1: i64,
    pm2_5: i64,
    pm10: i64,
    limiter: EventLimiter,
}

impl AirQualitySensor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pm1: 0,
            pm2_5: 0,
            pm10: 0,
            limiter: new_sensor_limiter(),
        }
    }

    pub fn try_emit(&mut self, now_ms: u64, pm1: i64, pm2_5: i64, pm10: i64) -> Option<serde_json::Value> {
        match self.limiter.check(now_ms) {
            Gate::Allow => {
                self.pm1 = pm1;
                self.pm2_5 = pm2_5;
                self.pm10 = pm10;
                Some(serde_json::json!({ "pm1": pm1, "pm2_5": pm2_5, "pm10": pm10 }))
            }
            Gate::Block => None,
        }
    }
}

impl Default for AirQualitySensor {
    fn default() -> Self {
        Self::new()
    }
}
