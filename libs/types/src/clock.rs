//! Wall-clock nanosecond timestamps
//!
//! Feed timestamps are informational only and must never be used for
//! ordering; sequence numbers carry the event order. The publisher takes
//! the clock as a plain function so tests can pin it.

use std::time::{SystemTime, UNIX_EPOCH};

/// A nanosecond timestamp since the Unix epoch
pub type TimeStamp = u64;

/// A source of timestamps, injectable for tests
pub type TimeSource = fn() -> TimeStamp;

/// Current wall-clock time in Unix nanoseconds
pub fn now_nanos() -> TimeStamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as TimeStamp)
        .unwrap_or(0)
}
