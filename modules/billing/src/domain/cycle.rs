//! Anchored monthly billing-cycle arithmetic.
//!
//! Cycle boundaries recur on the anchor's calendar day, clamped to the length
//! of each month, with the anchor's time-of-day preserved down to nanoseconds.
//! Everything here is pure: the same `(anchor, now)` pair always yields the
//! same window, which downstream consistency depends on.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::contract::model::CycleWindow;

/// Compute the active cycle `[start, end)` containing `now` for the given
/// anchor. Always succeeds; the caller substitutes a fallback anchor when no
/// real one exists.
pub fn window(anchor: DateTime<Utc>, now: DateTime<Utc>) -> CycleWindow {
    let day = anchor.day();
    let tod = anchor.time();

    let this_month = anchored_in_month(now.year(), now.month(), day, tod);
    if now < this_month {
        let (py, pm) = previous_month(now.year(), now.month());
        CycleWindow {
            start: anchored_in_month(py, pm, day, tod),
            end: this_month,
        }
    } else {
        let (ny, nm) = next_month(now.year(), now.month());
        CycleWindow {
            start: this_month,
            end: anchored_in_month(ny, nm, day, tod),
        }
    }
}

/// Shift an instant one month forward, clamping the day to the target
/// month's length. Used to derive a missing subscription period end.
pub fn shift_one_month(instant: DateTime<Utc>) -> DateTime<Utc> {
    let (ny, nm) = next_month(instant.year(), instant.month());
    anchored_in_month(ny, nm, instant.day(), instant.time())
}

/// The anchor's timestamp projected into a specific month: same time-of-day,
/// day clamped to the month's length (31 -> 28/29 in February).
fn anchored_in_month(year: i32, month: u32, anchor_day: u32, tod: NaiveTime) -> DateTime<Utc> {
    let day = anchor_day.min(days_in_month(year, month));
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or(NaiveDate::MIN); // unreachable: day is clamped to a valid range
    Utc.from_utc_datetime(&date.and_time(tod))
}

fn days_in_month(year: i32, month: u32) -> u32 {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next_first| next_first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().expect("valid test timestamp")
    }

    #[test]
    fn window_contains_now() {
        let anchor = utc("2024-01-15T08:30:00Z");
        for now in [
            utc("2024-03-10T00:00:00Z"),
            utc("2024-03-15T08:29:59Z"),
            utc("2024-03-15T08:30:00Z"),
            utc("2024-12-31T23:59:59Z"),
        ] {
            let w = window(anchor, now);
            assert!(w.contains(now), "window {w:?} must contain {now}");
        }
    }

    #[test]
    fn mid_month_anchor_before_anchor_day() {
        // User created 2024-01-15, evaluated 2024-03-10: now is before this
        // month's anchored day, so the cycle started on 2024-02-15.
        let w = window(utc("2024-01-15T00:00:00Z"), utc("2024-03-10T00:00:00Z"));
        assert_eq!(w.start, utc("2024-02-15T00:00:00Z"));
        assert_eq!(w.end, utc("2024-03-15T00:00:00Z"));
    }

    #[test]
    fn mid_month_anchor_on_or_after_anchor_day() {
        let w = window(utc("2024-01-15T00:00:00Z"), utc("2024-03-20T12:00:00Z"));
        assert_eq!(w.start, utc("2024-03-15T00:00:00Z"));
        assert_eq!(w.end, utc("2024-04-15T00:00:00Z"));
    }

    #[test]
    fn day_31_clamps_in_february_non_leap() {
        let w = window(utc("2023-01-31T10:00:00Z"), utc("2023-02-10T00:00:00Z"));
        assert_eq!(w.start, utc("2023-01-31T10:00:00Z"));
        assert_eq!(w.end, utc("2023-02-28T10:00:00Z"));

        let w = window(utc("2023-01-31T10:00:00Z"), utc("2023-03-01T00:00:00Z"));
        assert_eq!(w.start, utc("2023-02-28T10:00:00Z"));
        assert_eq!(w.end, utc("2023-03-31T10:00:00Z"));
    }

    #[test]
    fn day_31_clamps_in_february_leap_year() {
        let w = window(utc("2024-01-31T10:00:00Z"), utc("2024-02-29T11:00:00Z"));
        assert_eq!(w.start, utc("2024-02-29T10:00:00Z"));
        assert_eq!(w.end, utc("2024-03-31T10:00:00Z"));
    }

    #[test]
    fn day_31_clamps_in_thirty_day_month() {
        let w = window(utc("2024-03-31T00:00:00Z"), utc("2024-04-15T00:00:00Z"));
        assert_eq!(w.start, utc("2024-03-31T00:00:00Z"));
        assert_eq!(w.end, utc("2024-04-30T00:00:00Z"));
    }

    #[test]
    fn year_boundary_rolls_over() {
        let w = window(utc("2023-06-20T00:00:00Z"), utc("2023-12-25T00:00:00Z"));
        assert_eq!(w.start, utc("2023-12-20T00:00:00Z"));
        assert_eq!(w.end, utc("2024-01-20T00:00:00Z"));

        let w = window(utc("2023-06-20T00:00:00Z"), utc("2024-01-05T00:00:00Z"));
        assert_eq!(w.start, utc("2023-12-20T00:00:00Z"));
        assert_eq!(w.end, utc("2024-01-20T00:00:00Z"));
    }

    #[test]
    fn time_of_day_is_preserved() {
        let anchor = utc("2024-01-15T23:45:30.123456789Z");
        let w = window(anchor, utc("2024-04-01T00:00:00Z"));
        assert_eq!(w.start, utc("2024-03-15T23:45:30.123456789Z"));
        assert_eq!(w.end, utc("2024-04-15T23:45:30.123456789Z"));
    }

    #[test]
    fn consecutive_windows_have_no_gaps() {
        let anchor = utc("2023-10-31T06:00:00Z");
        let mut now = utc("2023-11-05T00:00:00Z");
        let mut prev_end = None;
        // Walk a year of cycles; each window must start where the last ended.
        for _ in 0..12 {
            let w = window(anchor, now);
            if let Some(end) = prev_end {
                assert_eq!(w.start, end, "gap or overlap at {now}");
            }
            prev_end = Some(w.end);
            now = w.end;
        }
    }

    #[test]
    fn deterministic_for_same_inputs() {
        let anchor = utc("2024-05-31T17:20:00Z");
        let now = utc("2024-06-29T00:00:00Z");
        assert_eq!(window(anchor, now), window(anchor, now));
    }

    #[test]
    fn shift_one_month_clamps_and_rolls() {
        assert_eq!(
            shift_one_month(utc("2024-06-01T00:00:00Z")),
            utc("2024-07-01T00:00:00Z")
        );
        assert_eq!(
            shift_one_month(utc("2024-01-31T12:00:00Z")),
            utc("2024-02-29T12:00:00Z")
        );
        assert_eq!(
            shift_one_month(utc("2023-12-15T00:00:00Z")),
            utc("2024-01-15T00:00:00Z")
        );
    }
}
