//! Monotonic clock and RNG collaborator contracts.
//!
//! The core never reads the wall clock or a hardware RNG directly; it asks
//! for them through these two traits, matching the external-collaborator
//! contracts described for the network link and crypto primitives.

use std::time::{Duration, Instant};

/// Monotonic time plus an optional settable epoch offset, matching the
/// original device SDK's timestamp model: `createdAt` is
/// monotonic-since-boot unless a server-delivered offset has been applied.
pub trait Clock: Send {
    /// Milliseconds elapsed on a monotonic clock. Never goes backwards.
    fn now_ms(&self) -> u64;

    /// Unix epoch seconds for `payload.createdAt`. Advisory: the wire
    /// format's notion of a "correct" timestamp is server-governed.
    fn epoch_seconds(&self) -> i64;

    /// Applies a server-delivered offset to future `epoch_seconds()` calls.
    /// No code path in the core calls this automatically; it exists for a
    /// host that wants to wire up time-sync itself.
    fn set_epoch_offset(&mut self, offset_seconds: i64);
}

/// 32-bit uniform random, used for WebSocket frame masking keys and the
/// `Sec-WebSocket-Key` handshake nonce.
pub trait Rng: Send {
    fn next_u32(&mut self) -> u32;

    fn fill_bytes(&mut self, buf: &mut [u8]) {
        for chunk in buf.chunks_mut(4) {
            let word = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
    }
}

/// Default [`Clock`] backed by [`std::time::Instant`] for monotonic
/// duration and [`chrono`] for epoch seconds.
pub struct SystemClock {
    start: Instant,
    epoch_offset: i64,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            epoch_offset: 0,
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn epoch_seconds(&self) -> i64 {
        chrono::Utc::now().timestamp() + self.epoch_offset
    }

    fn set_epoch_offset(&mut self, offset_seconds: i64) {
        self.epoch_offset = offset_seconds;
    }
}

/// Default [`Rng`] backed by the `rand` crate's thread-local generator.
#[derive(Default)]
pub struct SystemRng;

impl Rng for SystemRng {
    fn next_u32(&mut self) -> u32 {
        rand::random()
    }
}

/// A small helper shared by callers that just want "how long has it been
/// since `t0`", expressed in the `Duration` the limiter operates on.
#[must_use]
pub fn ms_since(now_ms: u64, earlier_ms: u64) -> Duration {
    Duration::from_millis(now_ms.saturating_sub(earlier_ms))
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::{Clock, Rng};
    use std::cell::Cell;

    /// Deterministic clock for tests: `now_ms()` returns whatever was last
    /// set with [`FakeClock::advance`] or [`FakeClock::set`].
    #[derive(Default)]
    pub struct FakeClock {
        now_ms: Cell<u64>,
        epoch_offset: Cell<i64>,
    }

    impl FakeClock {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        pub fn advance(&self, delta_ms: u64) {
            self.now_ms.set(self.now_ms.get() + delta_ms);
        }

        pub fn set(&self, now_ms: u64) {
            self.now_ms.set(now_ms);
        }
    }

    impl Clock for FakeClock {
        fn now_ms(&self) -> u64 {
            self.now_ms.get()
        }

        fn epoch_seconds(&self) -> i64 {
            i64::try_from(self.now_ms.get() / 1000).unwrap_or(i64::MAX) + self.epoch_offset.get()
        }

        fn set_epoch_offset(&mut self, offset_seconds: i64) {
            self.epoch_offset.set(offset_seconds);
        }
    }

    /// Deterministic RNG for tests: cycles through a fixed sequence, or
    /// always returns a constant if only one value was supplied.
    pub struct FakeRng {
        sequence: Vec<u32>,
        index: usize,
    }

    impl FakeRng {
        #[must_use]
        pub fn constant(value: u32) -> Self {
            Self {
                sequence: vec![value],
                index: 0,
            }
        }

        #[must_use]
        pub fn sequence(values: Vec<u32>) -> Self {
            Self {
                sequence: values,
                index: 0,
            }
        }
    }

    impl Rng for FakeRng {
        fn next_u32(&mut self) -> u32 {
            let value = self.sequence[self.index % self.sequence.len()];
            self.index += 1;
            value
        }
    }
}
