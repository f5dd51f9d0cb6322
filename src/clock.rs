//! Time source abstraction for the sampling window and the hourly cadence.

use std::cell::Cell;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Trait representing a monotonic time source that can also block.
///
/// Sampling windows and the monitoring cadence are measured against this
/// clock so the loops can be driven deterministically in tests.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);

    /// Wall-clock seconds since the Unix epoch, for report timestamps.
    fn unix_time(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Default clock backed by `Instant::now` and `thread::sleep`.
#[derive(Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Clock that only advances when slept on, or when `tick` is configured.
///
/// Every call to `now` advances time by `tick`, which models the cost of an
/// ADC conversion when the sampler is driven without real delays.
pub struct ManualClock {
    origin: Instant,
    offset: Cell<Duration>,
    tick: Duration,
    slept: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::with_tick(Duration::ZERO)
    }

    pub fn with_tick(tick: Duration) -> Self {
        Self {
            origin: Instant::now(),
            offset: Cell::new(Duration::ZERO),
            tick,
            slept: Cell::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, duration: Duration) {
        self.offset.set(self.offset.get() + duration);
    }

    /// Time elapsed since construction
    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }

    /// Total time requested through `sleep`
    pub fn total_slept(&self) -> Duration {
        self.slept.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let now = self.origin + self.offset.get();
        self.advance(self.tick);
        now
    }

    fn sleep(&self, duration: Duration) {
        self.slept.set(self.slept.get() + duration);
        self.advance(duration);
    }

    fn unix_time(&self) -> u64 {
        self.offset.get().as_secs()
    }
}
