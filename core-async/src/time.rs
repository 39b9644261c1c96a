//! Time-related abstractions.
//!
//! Re-exports tokio's timer primitives. Under `tokio::test(start_paused = true)`
//! these honour the paused clock, which is how the debounce, settle and
//! timeout behaviour of the core is tested deterministically.

pub use std::time::{Duration, SystemTime, UNIX_EPOCH};
pub use tokio::time::{error::Elapsed, interval, sleep, sleep_until, timeout, Instant, Interval};

/// Returns the current time as milliseconds since UNIX_EPOCH.
///
/// Falls back to `0` if the system clock is set before the epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
