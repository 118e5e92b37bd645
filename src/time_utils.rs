// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 with millisecond precision and a `Z` suffix.
///
/// The output is fixed width, so string order matches time order.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Format Unix seconds like [`format_utc_rfc3339`]. Out-of-range values give `None`.
pub fn format_unix_rfc3339(secs: u64) -> Option<String> {
    let secs = i64::try_from(secs).ok()?;
    DateTime::from_timestamp(secs, 0).map(format_utc_rfc3339)
}

/// Current time in the stored timestamp format.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_is_fixed_width() {
        let whole = DateTime::from_timestamp(1_767_225_600, 0).unwrap();
        let fractional = DateTime::from_timestamp(1_767_225_600, 5_000_000).unwrap();
        assert_eq!(format_utc_rfc3339(whole), "2026-01-01T00:00:00.000Z");
        assert_eq!(format_utc_rfc3339(fractional), "2026-01-01T00:00:00.005Z");
        assert!(format_utc_rfc3339(whole) < format_utc_rfc3339(fractional));
        assert_eq!(
            format_unix_rfc3339(1_767_225_600).as_deref(),
            Some("2026-01-01T00:00:00.000Z")
        );
        assert_eq!(format_unix_rfc3339(u64::MAX), None);
    }
}
