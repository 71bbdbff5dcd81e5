//! PowerSensor capability: event-only, `powerUsage` →
//! `{startTime, voltage, current, power, apparentPower?, reactivePower?,
//! factor?, wattHours}`. Sensor-limiter preset (60s).
//!
//! Unspecified inputs are `None` here rather than the original's `-1.0`
//! float sentinel. `power` is computed from `voltage * current` when
//! absent; `factor` from `power / apparentPower` when absent and
//! `apparentPower` is known and positive. `wattHours` accumulates from the
//! elapsed time since the first successful emission, using the *previous*
//! call's power reading (not the current one) — exactly as upstream.

use crate::limiter::{new_sensor_limiter, EventLimiter, Gate};

pub const ACTION_POWER_USAGE: &str = "powerUsage";

#[derive(Debug, Clone, Copy, Default)]
pub struct PowerReading {
    pub voltage: f64,
    pub current: f64,
    pub power: Option<f64>,
    pub apparent_power: Option<f64>,
    pub reactive_power: Option<f64>,
    pub factor: Option<f64>,
}

pub struct PowerSensor {
    limiter: EventLimiter,
    start_time_epoch_s: Option<i64>,
    last_power: f64,
}

impl PowerSensor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            limiter: new_sensor_limiter(),
            start_time_epoch_s: None,
            last_power: 0.0,
        }
    }

    pub fn try_emit(
        &mut self,
        now_ms: u64,
        now_epoch_s: i64,
        reading: PowerReading,
    ) -> Option<serde_json::Value> {
        if self.limiter.check(now_ms) == Gate::Block {
            return None;
        }

        let power = reading
            .power
            .unwrap_or(reading.voltage * reading.current);
        let factor = reading.factor.or_else(|| {
            reading
                .apparent_power
                .filter(|ap| *ap > 0.0)
                .map(|ap| power / ap)
        });

        let watt_hours = match self.start_time_epoch_s {
            Some(start) => {
                let elapsed_seconds = (now_epoch_s - start).max(0) as f64;
                elapsed_seconds * self.last_power / 3600.0
            }
            None => 0.0,
        };

        let mut value = serde_json::json!({
            "startTime": now_epoch_s,
            "voltage": reading.voltage,
            "current": reading.current,
            "power": power,
            "wattHours": watt_hours,
        });
        if let Some(obj) = value.as_object_mut() {
            if let Some(ap) = reading.apparent_power {
                obj.insert("apparentPower".to_string(), serde_json::json!(ap));
            }
            if let Some(rp) = reading.reactive_power {
                obj.insert("reactivePower".to_string(), serde_json::json!(rp));
            }
            if let Some(f) = factor {
                obj.insert("factor".to_string(), serde_json::json!(f));
            }
        }

        if self.start_time_epoch_s.is_none() {
            self.start_time_epoch_s = Some(now_epoch_s);
        }
        self.last_power = power;

        Some(value)
    }
}

impl Default for PowerSensor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_power_from_voltage_and_current_when_absent() {
        let mut cap = PowerSensor::new();
        let value = cap
            .try_emit(
                0,
                1_700_000_000,
                PowerReading {
                    voltage: 120.0,
                    current: 2.0,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(value["power"], serde_json::json!(240.0));
        assert_eq!(value["wattHours"], serde_json::json!(0.0));
        assert!(value.get("factor").is_none());
    }

    #[test]
    fn watt_hours_accumulate_from_previous_power_and_elapsed_time() {
        let mut cap = PowerSensor::new();
        cap.try_emit(
            0,
            1_700_000_000,
            PowerReading {
                voltage: 120.0,
                current: 1.0,
                ..Default::default()
            },
        )
        .unwrap();
        let value = cap
            .try_emit(
                60_000,
                1_700_003_600,
                PowerReading {
                    voltage: 120.0,
                    current: 2.0,
                    ..Default::default()
                },
            )
            .unwrap();
        // 3600s elapsed at the previous 120W reading => 120 Wh.
        assert_eq!(value["wattHours"], serde_json::json!(120.0));
    }

    #[test]
    fn factor_computed_from_power_over_apparent_power() {
        let mut cap = PowerSensor::new();
        let value = cap
            .try_emit(
                0,
                1_700_000_000,
                PowerReading {
                    voltage: 120.0,
                    current: 2.0,
                    apparent_power: Some(300.0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(value["factor"], serde_json::json!(240.0 / 300.0));
    }
}
