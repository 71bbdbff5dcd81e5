//! ContactSensor capability: event-only, `setContactState` →
//! `{state: "open" | "closed"}`. State-limiter preset.

use crate::limiter::{new_state_limiter, EventLimiter, Gate};

pub const ACTION_SET_CONTACT_STATE: &str = "setContactState";

pub struct ContactSensor {
    open: bool,
    limiter: EventLimiter,
}

impl ContactSensor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            open: false,
            limiter: new_state_limiter(),
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn try_emit(&mut self, now_ms: u64, is_open: bool) -> Option<serde_json::Value> {
        match self.limiter.check(now_ms) {
            Gate::Allow => {
                self.open = is_open;
                Some(serde_json::json!({ "state": if is_open { "open" } else { "closed" } }))
            }
            Gate::Block => None,
        }
    }
}

impl Default for ContactSensor {
    fn default() -> Self {
        Self::new()
    }
}
