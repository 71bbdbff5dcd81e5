//! Doorbell capability: event-only, a single `DoorbellPress` → `{state:
//! "pressed"}`. Uses the state (1s) limiter preset — a doorbell press is a
//! toggle-like burst, not a periodic sensor reading.

use crate::limiter::{new_state_limiter, EventLimiter, Gate};

pub const ACTION_DOORBELL_PRESS: &str = "DoorbellPress";

pub struct Doorbell {
    limiter: EventLimiter,
}

impl Doorbell {
    #[must_use]
    pub fn new() -> Self {
        Self {
            limiter: new_state_limiter(),
        }
    }

    /// Attempts to emit a press event. Returns `None` if rate-limited.
    pub fn try_emit(&mut self, now_ms: u64) -> Option<serde_json::Value> {
        match self.limiter.check(now_ms) {
            Gate::Allow => Some(serde_json::json!({ "state": "pressed" })),
            Gate::Block => None,
        }
    }
}

impl Default for Doorbell {
    fn default() -> Self {
        Self::new()
    }
}
