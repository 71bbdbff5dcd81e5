//! MotionSensor capability: event-only, `setMotionDetection` →
//! `{state: "detected" | "notDetected"}`. State-limiter preset.

use crate::limiter::{new_state_limiter, EventLimiter, Gate};

pub const ACTION_SET_MOTION_DETECTION: &str = "setMotionDetection";

pub struct MotionSensor {
    detected: bool,
    limiter: EventLimiter,
}

impl MotionSensor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            detected: false,
            limiter: new_state_limiter(),
        }
    }

    #[must_use]
    pub fn is_detected(&self) -> bool {
        self.detected
    }

    pub fn try_emit(&mut self, now_ms: u64, detected: bool) -> Option<serde_json::Value> {
        match self.limiter.check(now_ms) {
            Gate::Allow => {
                self.detected = detected;
                Some(serde_json::json!({ "state": if detected { "detected" } else { "notDetected" } }))
            }
            Gate::Block => None,
        }
    }
}

impl Default for MotionSensor {
    fn default() -> Self {
        Self::new()
    }
}
