//! Timestamp types for Strata.
//!
//! Schema rows and sequence records are versioned by these timestamps, and
//! every read is "as of" one of them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A timestamp in microseconds since the Unix epoch.
///
/// # Example
///
/// ```rust
/// use strata_common::types::Timestamp;
///
/// let ts = Timestamp::now();
/// assert!(ts.as_micros() > 0);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Zero timestamp (epoch).
    pub const ZERO: Self = Self(0);

    /// Maximum timestamp value. Reads at `MAX` see the latest versions.
    pub const MAX: Self = Self(u64::MAX);

    /// Creates a timestamp from microseconds since Unix epoch.
    #[inline]
    #[must_use]
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Creates a timestamp from the current system time.
    #[must_use]
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Self(u64::try_from(duration.as_micros()).unwrap_or(u64::MAX))
    }

    /// Returns the timestamp as microseconds since Unix epoch.
    #[inline]
    #[must_use]
    pub const fn as_micros(self) -> u64 {
        self.0
    }

    /// Returns the next representable timestamp.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Returns the previous representable timestamp.
    #[inline]
    #[must_use]
    pub const fn prev(self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}us)", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format as ISO 8601 if reasonable
        if self.0 > 0 && self.0 < i64::MAX as u64 {
            let secs = (self.0 / 1_000_000) as i64;
            let subsec_micros = (self.0 % 1_000_000) as u32;
            if let Some(dt) = chrono::DateTime::from_timestamp(secs, subsec_micros * 1000) {
                return write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.6fZ"));
            }
        }
        write!(f, "{}us", self.0)
    }
}

impl From<u64> for Timestamp {
    #[inline]
    fn from(micros: u64) -> Self {
        Self::from_micros(micros)
    }
}

impl From<Timestamp> for u64 {
    #[inline]
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

/// A source of monotonic timestamps.
pub trait TimestampSource: Send + Sync + fmt::Debug {
    /// Returns a timestamp no smaller than any previously returned one.
    fn now(&self) -> Timestamp;
}

/// Wall-clock timestamps that never repeat or go backwards.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: AtomicU64,
}

impl SystemClock {
    /// Creates a new system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimestampSource for SystemClock {
    fn now(&self) -> Timestamp {
        let wall = Timestamp::now().as_micros();
        let mut last = self.last.load(AtomicOrdering::Acquire);
        loop {
            let next = wall.max(last.saturating_add(1));
            match self.last.compare_exchange_weak(
                last,
                next,
                AtomicOrdering::AcqRel,
                AtomicOrdering::Acquire,
            ) {
                Ok(_) => return Timestamp(next),
                Err(observed) => last = observed,
            }
        }
    }
}

/// A clock driven explicitly by the caller (tests, replays).
#[derive(Debug, Default)]
pub struct ManualClock {
    current: AtomicU64,
}

impl ManualClock {
    /// Creates a clock reading `start`.
    #[must_use]
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: AtomicU64::new(start.as_micros()),
        }
    }

    /// Sets the clock.
    pub fn set(&self, ts: Timestamp) {
        self.current.store(ts.as_micros(), AtomicOrdering::Release);
    }

    /// Advances the clock and returns the new reading.
    pub fn advance(&self, micros: u64) -> Timestamp {
        Timestamp(self.current.fetch_add(micros, AtomicOrdering::AcqRel) + micros)
    }
}

impl TimestampSource for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.current.load(AtomicOrdering::Acquire))
    }
}
