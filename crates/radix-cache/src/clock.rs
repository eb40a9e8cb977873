//! Injectable time source.
//!
//! TTL arithmetic and signature validity windows both depend on "now",
//! so the clock is a trait: production code uses [`SystemClock`], tests
//! advance a [`FakeClock`] deterministically.

use parking_lot::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A source of wall-clock time.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> SystemTime;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FakeClock {
    now: Mutex<SystemTime>,
}

impl FakeClock {
    /// Creates a fake clock starting at `start`.
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Advances the clock by `delta`.
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock();
        *now += delta;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(SystemTime::now())
    }
}

impl Clock for FakeClock {
    fn now(&self) -> SystemTime {
        *self.now.lock()
    }
}

/// Returns `t` as whole seconds since the Unix epoch.
pub fn unix_seconds(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_clock_advances() {
        let clock = FakeClock::new(UNIX_EPOCH + Duration::from_secs(1000));
        assert_eq!(unix_seconds(clock.now()), 1000);
        clock.advance(Duration::from_secs(30));
        assert_eq!(unix_seconds(clock.now()), 1030);
    }
}
