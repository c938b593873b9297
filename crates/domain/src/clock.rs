//! Shared time source.
//!
//! Engine operations receive `now` explicitly; only read facades and the
//! host hold a [`Clock`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Monotonically non-decreasing time source, in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Clock driven by the host, e.g. the block timestamp or a test harness.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    /// Moves the clock to `time`. Earlier times are ignored so the clock
    /// never runs backwards; returns the resulting time.
    pub fn advance_to(&self, time: u64) -> u64 {
        self.now.fetch_max(time, Ordering::SeqCst).max(time)
    }

    /// Moves the clock forward by `seconds`.
    pub fn advance_by(&self, seconds: u64) -> u64 {
        let previous = self
            .now
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| {
                Some(t.saturating_add(seconds))
            })
            .unwrap_or_else(|t| t);
        previous.saturating_add(seconds)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Wall clock in Unix seconds.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}
