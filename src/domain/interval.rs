//! Half-open time interval arithmetic for table occupancy.
//!
//! All timestamps are restaurant wall-clock time (`NaiveDateTime`). A booking
//! occupies `[start, start + duration)`: a booking ending at 20:00 and another
//! starting at 20:00 do not conflict.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};

const WALL_CLOCK_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// A half-open occupancy window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// Builds `[start, start + minutes)`. Returns `None` when the end is not
    /// representable.
    pub fn starting_at(start: NaiveDateTime, minutes: u32) -> Option<Self> {
        let end = start.checked_add_signed(Duration::minutes(i64::from(minutes)))?;
        Some(Self { start, end })
    }

    /// True iff this window intersects a candidate booking's window.
    pub fn overlaps(&self, candidate_start: NaiveDateTime, candidate_minutes: u32) -> bool {
        overlaps(self.start, self.end, candidate_start, candidate_minutes)
    }
}

/// Returns true iff `[target_start, target_end)` and
/// `[candidate_start, candidate_start + candidate_minutes)` share an instant.
///
/// An inverted or empty target, or a candidate whose end overflows the
/// calendar, never overlaps anything.
pub fn overlaps(
    target_start: NaiveDateTime,
    target_end: NaiveDateTime,
    candidate_start: NaiveDateTime,
    candidate_minutes: u32,
) -> bool {
    if target_end <= target_start {
        return false;
    }
    let Some(candidate_end) =
        candidate_start.checked_add_signed(Duration::minutes(i64::from(candidate_minutes)))
    else {
        return false;
    };
    target_start < candidate_end && candidate_start < target_end
}

/// Parses a client-supplied timestamp into wall-clock time.
///
/// RFC 3339 values keep their local wall-clock reading and drop the offset.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.naive_local());
    }
    WALL_CLOCK_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Parses a `YYYY-MM-DD` calendar day.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// `[midnight, next midnight)` of the calendar day containing `at`.
pub fn day_bounds(at: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let start = at.date().and_time(NaiveTime::MIN);
    let end = at
        .date()
        .succ_opt()
        .map(|next| next.and_time(NaiveTime::MIN))
        .unwrap_or(NaiveDateTime::MAX);
    (start, end)
}
