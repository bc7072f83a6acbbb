//! Canonical time utilities — strict, no silent fallbacks.
//!
//! All functions return `Result` instead of silently defaulting to 0.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::Error;

/// Returns the current Unix timestamp in milliseconds as `i64`.
///
/// # Errors
///
/// Returns an error if the system clock is before the Unix epoch.
pub fn epoch_millis() -> Result<i64, Error> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| Error::internal(format!("system clock is before Unix epoch: {e}")))?;
    i64::try_from(duration.as_millis())
        .map_err(|e| Error::internal(format!("timestamp overflow for i64: {e}")))
}

/// Whether `b` falls strictly within `within_ms` milliseconds after `a`,
/// used by the temporal-proximity Pass 2 fallback (spec §4.5.2 step 4).
#[must_use]
pub fn within_gap(a: i64, b: i64, within_ms: i64) -> bool {
    b > a && (b - a) <= within_ms
}

/// Renders a Unix-millis timestamp as RFC 3339, for log fields and
/// diagnostics. Falls back to the raw millis if the value is out of chrono's
/// representable range.
#[must_use]
pub fn to_rfc3339(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| format!("<invalid-timestamp:{millis}>"))
}
