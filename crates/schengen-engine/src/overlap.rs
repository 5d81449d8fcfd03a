//! Clamp a date range to a window and count the days they share.
//!
//! Day counts are inclusive: a stay from Jan 1 to Jan 1 is one day, because
//! both the day of entry and the day of exit count as days present.

use chrono::NaiveDate;

/// Intersect `[entry, exit]` with `[window_start, window_end]`.
///
/// Returns `None` when the two ranges are disjoint (or when either range is
/// itself empty).
pub fn clamp_to_window(
    entry: NaiveDate,
    exit: NaiveDate,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Option<(NaiveDate, NaiveDate)> {
    let clamped_entry = entry.max(window_start);
    let clamped_exit = exit.min(window_end);
    (clamped_entry <= clamped_exit).then_some((clamped_entry, clamped_exit))
}

/// Number of days `[entry, exit]` shares with `[window_start, window_end]`,
/// both ends inclusive. Disjoint ranges share 0 days.
pub fn overlap_days(
    entry: NaiveDate,
    exit: NaiveDate,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> i64 {
    clamp_to_window(entry, exit, window_start, window_end)
        .map(|(start, end)| inclusive_days(start, end))
        .unwrap_or(0)
}

/// Inclusive day count of `[start, end]`, or 0 if `start > end`.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    if start > end {
        0
    } else {
        (end - start).num_days() + 1
    }
}
