// src/watermark.rs
use chrono::{DateTime, Utc};

/// Source of wall-clock time for the poll loop
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Cutoff before which transactions count as already emitted.
///
/// Owned by the poll loop and handed to each cycle by `&mut`, so the
/// read-then-write in [`Watermark::capture_and_advance`] cannot interleave
/// with another cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watermark {
    value: DateTime<Utc>,
}

impl Watermark {
    pub fn starting_at(value: DateTime<Utc>) -> Self {
        Self { value }
    }

    /// Everything on the page counts as new on the first cycle.
    pub fn from_beginning() -> Self {
        Self::starting_at(DateTime::<Utc>::MIN_UTC)
    }

    pub fn value(&self) -> DateTime<Utc> {
        self.value
    }

    /// Returns the held cutoff and replaces it with `now`, unconditionally.
    pub fn capture_and_advance(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        std::mem::replace(&mut self.value, now)
    }
}
