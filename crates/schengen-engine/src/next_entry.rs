//! Search forward for the first day with allowance to spare.
//!
//! The search re-evaluates compliance from scratch for each candidate day,
//! starting the day after `from_date`, and stops after
//! [`Rule::search_horizon_days`] candidates.

use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::rule::Rule;
use crate::stay::Stay;

/// Outcome of a next-entry search.
///
/// When no candidate qualifies, `next_possible_entry` is `None` and `error`
/// explains why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextEntryResult {
    pub next_possible_entry: Option<NaiveDate>,
    /// Days from `from_date` to `next_possible_entry`.
    pub days_until_entry: Option<i64>,
    /// Allowance available on `next_possible_entry`.
    pub days_available: i64,
    pub error: Option<String>,
}

impl NextEntryResult {
    pub fn is_found(&self) -> bool {
        self.next_possible_entry.is_some()
    }
}

impl Rule {
    /// Find the earliest day after `from_date` on which at least one day of
    /// allowance is available.
    pub fn next_possible_entry(&self, stays: &[Stay], from_date: NaiveDate) -> NextEntryResult {
        for offset in 1..=self.search_horizon_days() {
            let Some(candidate) =
                TimeDelta::try_days(offset).and_then(|delta| from_date.checked_add_signed(delta))
            else {
                break;
            };
            let compliance = self.compliance(stays, candidate);
            if compliance.days_remaining > 0 {
                tracing::debug!(%from_date, %candidate, offset, "found next possible entry");
                return NextEntryResult {
                    next_possible_entry: Some(candidate),
                    days_until_entry: Some(offset),
                    days_available: compliance.days_remaining,
                    error: None,
                };
            }
        }

        tracing::debug!(
            %from_date,
            horizon = self.search_horizon_days(),
            "no entry date found within search horizon"
        );
        NextEntryResult {
            next_possible_entry: None,
            days_until_entry: None,
            days_available: 0,
            error: Some(format!(
                "No possible entry date found within the next {} days",
                self.search_horizon_days()
            )),
        }
    }
}

/// Find the next possible entry date under the standard 90/180 rule.
pub fn find_next_possible_entry(stays: &[Stay], from_date: NaiveDate) -> NextEntryResult {
    Rule::default().next_possible_entry(stays, from_date)
}
