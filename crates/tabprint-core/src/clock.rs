//! Injectable monotonic time for duration measurement and scheduling.
//!
//! The loader and scheduler never read the system clock directly. They go
//! through a [`Clock`] handle so that tests can drive time deterministically
//! with a [`FakeClock`] while production code uses [`MonotonicClock`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic time readings since an arbitrary process-local epoch.
pub trait Clock: Send + Sync {
    /// Elapsed time since the clock's epoch. Never decreases.
    fn now(&self) -> Duration;
}

/// Shared clock handle as injected into loaders and the scheduler.
pub type SharedClock = Arc<dyn Clock>;

/// Production clock backed by [`std::time::Instant`].
#[derive(Debug)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Manually advanced clock for deterministic tests.
///
/// Time only moves when [`FakeClock::advance`] is called, so tests can place
/// a precise amount of "work" between two readings.
#[derive(Debug, Default)]
pub struct FakeClock {
    now_micros: AtomicU64,
}

impl FakeClock {
    /// Create a shared fake clock starting at zero.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Move time forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        self.now_micros
            .fetch_add(delta.as_micros() as u64, Ordering::SeqCst);
    }

    /// Jump to an absolute reading.
    pub fn set(&self, now: Duration) {
        self.now_micros
            .store(now.as_micros() as u64, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Duration {
        Duration::from_micros(self.now_micros.load(Ordering::SeqCst))
    }
}
