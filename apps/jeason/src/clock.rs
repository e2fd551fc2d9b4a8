//! Wall-clock readings handed to the core.

use jeason_core::Timestamp;
use std::time::{SystemTime, UNIX_EPOCH};

fn since_epoch() -> std::time::Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

/// Current time in unix seconds.
#[must_use]
pub fn now() -> Timestamp {
    Timestamp(since_epoch().as_secs())
}

/// Current time in unix milliseconds, for transaction references.
#[must_use]
pub fn unix_millis() -> u64 {
    u64::try_from(since_epoch().as_millis()).unwrap_or(u64::MAX)
}
