//! Per-capability adaptive event rate limiter.
//!
//! Ported from the original SDK's `event_limiter`, with one deliberate
//! change: `check()` returns an unambiguous [`Gate`] enum instead of a
//! bare `bool` whose polarity ("true" meant *blocked*) was applied
//! inconsistently — some callers negated it, some didn't — across the
//! original capability modules. See DESIGN.md.

use std::time::Duration;

/// Outcome of [`EventLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Allow,
    Block,
}

impl Gate {
    #[must_use]
    pub fn is_allow(self) -> bool {
        matches!(self, Gate::Allow)
    }
}

/// State-capability preset: bursty (toggles, presses) may repeat at 1 Hz.
pub const STATE_MIN_DISTANCE_MS: u64 = 1_000;
/// Sensor-capability preset: server policy caps periodic sensor events at
/// one per minute.
pub const SENSOR_MIN_DISTANCE_MS: u64 = 60_000;

#[derive(Debug, Clone)]
pub struct EventLimiter {
    min_distance_ms: u64,
    next_event_time_ms: u64,
    extra_distance_ms: u64,
    fail_counter: u64,
}

impl EventLimiter {
    #[must_use]
    pub fn new(min_distance_ms: u64) -> Self {
        Self {
            min_distance_ms,
            next_event_time_ms: 0,
            extra_distance_ms: 0,
            fail_counter: 0,
        }
    }

    #[must_use]
    pub fn for_state() -> Self {
        Self::new(STATE_MIN_DISTANCE_MS)
    }

    #[must_use]
    pub fn for_sensor() -> Self {
        Self::new(SENSOR_MIN_DISTANCE_MS)
    }

    fn fail_threshold(&self) -> u64 {
        self.min_distance_ms / 4
    }

    /// `BLOCK` if `now_ms` is before `next_event_time`, else `ALLOW`.
    ///
    /// On `ALLOW`, first resolve the backoff: if `fail_counter` exceeded
    /// the threshold since the last `ALLOW`, fold another `min_distance_ms`
    /// into `extra_distance_ms` and zero the counter; otherwise clear
    /// `extra_distance_ms`. Then advance
    /// `next_event_time := now + min_distance_ms + extra_distance_ms`.
    ///
    /// On `BLOCK`, increment `fail_counter` and warn exactly once, the
    /// instant it crosses the threshold.
    pub fn check(&mut self, now_ms: u64) -> Gate {
        if now_ms >= self.next_event_time_ms {
            if self.fail_counter > self.fail_threshold() {
                self.extra_distance_ms += self.min_distance_ms;
                self.fail_counter = 0;
            } else {
                self.extra_distance_ms = 0;
            }
            self.next_event_time_ms = now_ms + self.min_distance_ms + self.extra_distance_ms;
            return Gate::Allow;
        }

        self.fail_counter += 1;
        if self.fail_counter == self.fail_threshold() {
            tracing::warn!(
                min_distance_ms = self.min_distance_ms,
                extra_distance_ms = self.extra_distance_ms,
                "event limiter: excessive events detected, backoff will increase"
            );
        }
        Gate::Block
    }

    /// Milliseconds remaining until the next `check()` would return
    /// `ALLOW`, or `Duration::ZERO` if it would allow now.
    #[must_use]
    pub fn time_remaining(&self, now_ms: u64) -> Duration {
        Duration::from_millis(self.next_event_time_ms.saturating_sub(now_ms))
    }

    /// Extra spacing folded in by the adaptive backoff, on top of
    /// `min_distance_ms`.
    #[must_use]
    pub fn get_backoff(&self) -> u64 {
        self.extra_distance_ms
    }

    /// Clears all adaptive state. Does not change `min_distance_ms`.
    pub fn reset(&mut self) {
        self.next_event_time_ms = 0;
        self.extra_distance_ms = 0;
        self.fail_counter = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_check_always_allows() {
        let mut limiter = EventLimiter::new(1000);
        assert_eq!(limiter.check(0), Gate::Allow);
    }

    #[test]
    fn state_limiter_timing_invariant() {
        // Invariant 6 from the spec's testable properties.
        let mut limiter = EventLimiter::new(1000);
        assert_eq!(limiter.check(0), Gate::Allow);
        assert_eq!(limiter.check(999), Gate::Block);
        assert_eq!(limiter.check(1001), Gate::Allow);
        assert_eq!(limiter.check(2001), Gate::Allow);
    }

    #[test]
    fn sensor_preset_uses_sixty_seconds() {
        let mut limiter = EventLimiter::for_sensor();
        assert_eq!(limiter.check(0), Gate::Allow);
        assert_eq!(limiter.check(30_000), Gate::Block);
        assert_eq!(limiter.check(61_000), Gate::Allow);
    }

    #[test]
    fn backoff_doubles_min_distance_after_threshold_blocks() {
        // Invariant 7: after more than min_distance/4 consecutive BLOCKs,
        // the next ALLOW must push next_event_time out by 2 * min_distance.
        let mut limiter = EventLimiter::new(1000);
        assert_eq!(limiter.check(0), Gate::Allow); // next_event_time = 1000
        for t in 1..=251 {
            // 251 blocked checks (threshold is min_distance/4 = 250) leave
            // fail_counter at 251, i.e. strictly greater than the threshold.
            assert_eq!(limiter.check(t), Gate::Block);
        }
        assert_eq!(limiter.check(2000), Gate::Allow);
        // next_event_time = 2000 + 1000 (min) + 1000 (extra, folded in by
        // this very call) = 4000: a jump of 2 * min_distance from the 2000
        // the un-adapted next_event_time would otherwise have produced.
        assert_eq!(limiter.next_event_time_ms, 4000);
        assert_eq!(limiter.extra_distance_ms, 1000);
    }

    #[test]
    fn spaced_allows_reset_extra_distance() {
        let mut limiter = EventLimiter::new(1000);
        assert_eq!(limiter.check(0), Gate::Allow);
        assert_eq!(limiter.check(1000), Gate::Allow);
        assert_eq!(limiter.extra_distance_ms, 0);
    }
}
