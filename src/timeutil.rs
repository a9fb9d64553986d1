// ABOUTME: Timezone-aware time helpers shared by the rollup engine and dispatcher
// ABOUTME: Converts between epoch milliseconds and user-local calendar dates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

//! # Time Utilities
//!
//! All record timestamps are epoch milliseconds (UTC instants); everything the
//! user sees is formatted in their IANA timezone. These helpers are the only
//! place local/epoch conversion happens.

use crate::constants::time::LOCAL_DATETIME_FORMAT;
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// Parse an IANA timezone name, e.g. "Europe/London"
#[must_use]
pub fn parse_timezone(name: &str) -> Option<Tz> {
    name.parse::<Tz>().ok()
}

/// Convert an epoch-ms timestamp to the corresponding instant in `tz`
fn to_local(ts_ms: i64, tz: Tz) -> DateTime<Tz> {
    Utc.timestamp_millis_opt(ts_ms)
        .single()
        .unwrap_or_else(Utc::now)
        .with_timezone(&tz)
}

/// Local hour-of-day (0-23) of an instant in `tz`
#[must_use]
pub fn local_hour(ts_ms: i64, tz: Tz) -> u32 {
    to_local(ts_ms, tz).hour()
}

/// Local calendar date of an instant, `yyyy-MM-dd`
#[must_use]
pub fn format_local_date(ts_ms: i64, tz: Tz) -> String {
    to_local(ts_ms, tz).format("%Y-%m-%d").to_string()
}

/// Three-letter weekday of an instant's local date
#[must_use]
pub fn format_local_day_of_week(ts_ms: i64, tz: Tz) -> String {
    to_local(ts_ms, tz).format("%a").to_string()
}

/// Local date-time string used in prompts, `yyyy-MM-dd HH:mm:ss`
#[must_use]
pub fn format_local_datetime(instant: DateTime<Utc>, tz: Tz) -> String {
    instant
        .with_timezone(&tz)
        .format(LOCAL_DATETIME_FORMAT)
        .to_string()
}

/// Last millisecond of the local day containing `ts_ms`
///
/// The rollup window for "last N days ending today" ends here.
#[must_use]
pub fn end_of_local_day(ts_ms: i64, tz: Tz) -> i64 {
    let local = to_local(ts_ms, tz);
    let next_midnight = local
        .date_naive()
        .succ_opt()
        .unwrap_or_else(|| local.date_naive())
        .and_hms_opt(0, 0, 0)
        .unwrap_or_else(|| local.naive_local());
    local_naive_to_timestamp(next_midnight, tz).unwrap_or(ts_ms) - 1
}

/// Interpret a local naive date-time in `tz` as an epoch-ms instant
///
/// Ambiguous local times (DST fall-back) resolve to the earlier instant;
/// nonexistent local times (DST spring-forward gap) are an error.
///
/// # Errors
///
/// Returns an error if the local time does not exist in `tz`.
pub fn local_naive_to_timestamp(naive: NaiveDateTime, tz: Tz) -> AppResult<i64> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .ok_or_else(|| {
            AppError::invalid_input(format!("local time {naive} does not exist in {tz}"))
        })
}

/// Parse a `yyyy-MM-dd HH:mm:ss` local date-time string in `tz` to epoch ms
///
/// # Errors
///
/// Returns an error if the string does not match the format or the local
/// time does not exist in `tz`.
pub fn parse_local_datetime(s: &str, tz: Tz) -> AppResult<i64> {
    let naive = NaiveDateTime::parse_from_str(s, LOCAL_DATETIME_FORMAT)
        .map_err(|e| AppError::invalid_input(format!("invalid date-time {s:?}: {e}")))?;
    local_naive_to_timestamp(naive, tz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Tz;

    fn sgt() -> Tz {
        parse_timezone("Asia/Singapore").unwrap()
    }

    #[test]
    fn test_parse_timezone_rejects_garbage() {
        assert!(parse_timezone("Atlantis/Nowhere").is_none());
        assert!(parse_timezone("America/New_York").is_some());
    }

    #[test]
    fn test_local_date_crosses_utc_midnight() {
        // 2024-03-09 23:00 UTC is already 2024-03-10 07:00 in Singapore
        let ts = parse_local_datetime("2024-03-10 07:00:00", sgt()).unwrap();
        assert_eq!(format_local_date(ts, sgt()), "2024-03-10");
        assert_eq!(format_local_date(ts, chrono_tz::UTC), "2024-03-09");
    }

    #[test]
    fn test_end_of_local_day_is_last_millisecond() {
        let noon = parse_local_datetime("2024-03-10 12:00:00", sgt()).unwrap();
        let end = end_of_local_day(noon, sgt());
        assert_eq!(format_local_date(end, sgt()), "2024-03-10");
        assert_eq!(format_local_date(end + 1, sgt()), "2024-03-11");
    }

    #[test]
    fn test_local_hour() {
        let ts = parse_local_datetime("2024-03-10 06:30:00", sgt()).unwrap();
        assert_eq!(local_hour(ts, sgt()), 6);
    }

    #[test]
    fn test_parse_local_datetime_round_trips() {
        let ts = parse_local_datetime("2024-05-01 08:15:30", sgt()).unwrap();
        let utc = chrono::Utc.timestamp_millis_opt(ts).single().unwrap();
        assert_eq!(format_local_datetime(utc, sgt()), "2024-05-01 08:15:30");
    }
}
