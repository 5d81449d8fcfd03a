//! Per-calendar-month breakdown of days used.
//!
//! Each stay is first intersected with the requested range, then split at
//! month boundaries. Every piece adds its inclusive day count to its month and
//! leaves a per-trip record behind, so a stay from Jan 25 to Feb 5 shows up
//! once under `2024-01` (7 days) and once under `2024-02` (5 days).

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::overlap;
use crate::stay::Stay;

/// One stay's contribution to one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthTripDays {
    pub entry: NaiveDate,
    /// `None` for a stay that is still open.
    pub exit: Option<NaiveDate>,
    pub days_in_this_month: i64,
    pub country: String,
}

/// Usage within one calendar month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthUsage {
    pub total_days: i64,
    pub per_trip_days: Vec<MonthTripDays>,
}

/// Month key (`"YYYY-MM"`) to usage, iterated in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthlyBreakdown {
    months: BTreeMap<String, MonthUsage>,
}

impl MonthlyBreakdown {
    pub fn get(&self, key: &str) -> Option<&MonthUsage> {
        self.months.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MonthUsage)> {
        self.months.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    /// Sum of all month totals.
    pub fn total_days(&self) -> i64 {
        self.months.values().map(|m| m.total_days).sum()
    }

    fn add(&mut self, month_start: NaiveDate, trip: MonthTripDays) {
        let usage = self.months.entry(month_key(month_start)).or_default();
        usage.total_days += trip.days_in_this_month;
        usage.per_trip_days.push(trip);
    }
}

/// Format the `"YYYY-MM"` key of the month containing `date`.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Last day of the month containing `date`.
fn month_end(date: NaiveDate) -> NaiveDate {
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// Break `stays` down by calendar month within `[range_start, range_end]`.
///
/// Open stays run through `today`.
///
/// # Errors
/// Returns `EngineError::InvalidRange` if `range_start > range_end`.
pub fn monthly_breakdown(
    stays: &[Stay],
    range_start: NaiveDate,
    range_end: NaiveDate,
    today: NaiveDate,
) -> Result<MonthlyBreakdown> {
    if range_start > range_end {
        return Err(EngineError::InvalidRange {
            start: range_start,
            end: range_end,
        });
    }

    let mut breakdown = MonthlyBreakdown::default();

    for stay in stays {
        let Some((start, end)) =
            overlap::clamp_to_window(stay.entry(), stay.end_on(today), range_start, range_end)
        else {
            continue;
        };

        let mut cursor = start;
        while cursor <= end {
            let last = month_end(cursor);
            let piece_end = last.min(end);
            breakdown.add(
                cursor,
                MonthTripDays {
                    entry: stay.entry(),
                    exit: stay.exit(),
                    days_in_this_month: overlap::inclusive_days(cursor, piece_end),
                    country: stay.country().to_string(),
                },
            );
            match last.succ_opt() {
                Some(next) => cursor = next,
                None => break,
            }
        }
    }

    tracing::debug!(
        %range_start,
        %range_end,
        months = breakdown.len(),
        total_days = breakdown.total_days(),
        "built monthly breakdown"
    );
    Ok(breakdown)
}
