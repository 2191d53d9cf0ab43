//! # Time Source
//!
//! Timelocks compare against "now", and "now" must be injectable or the
//! tests turn into sleep-fests. Everything that needs the time takes a
//! [`Clock`]; production uses [`SystemClock`], tests use [`ManualClock`].

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Source of the current Unix time in whole seconds.
pub trait Clock {
    /// Seconds since the Unix epoch.
    fn unix_timestamp(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn unix_timestamp(&self) -> u64 {
        (**self).unix_timestamp()
    }
}

/// Wall-clock time from the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_timestamp(&self) -> u64 {
        // A host clock set before 1970 reads as the epoch.
        u64::try_from(Utc::now().timestamp()).unwrap_or(0)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Start the clock at `now`.
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move forward by `secs`, saturating at `u64::MAX`.
    pub fn advance(&self, secs: u64) {
        let mut current = self.now.load(Ordering::SeqCst);
        loop {
            let next = current.saturating_add(secs);
            match self
                .now
                .compare_exchange_weak(current, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Clock for ManualClock {
    fn unix_timestamp(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
