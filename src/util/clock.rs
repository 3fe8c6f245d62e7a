//! Wall-clock helpers.

use std::time::{SystemTime, UNIX_EPOCH};

use super::serde::UnixSeconds;

/// Milliseconds since the Unix epoch.
#[must_use]
pub fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Seconds since the Unix epoch, with sub-second precision.
#[must_use]
pub fn now_secs() -> UnixSeconds {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
