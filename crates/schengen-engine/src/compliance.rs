//! Point-in-time compliance with the rolling allowance rule.
//!
//! For a reference date `D`, the lookback window is `[D - 179, D]`: 180
//! calendar days with `D` included. Every stay is clamped to that window and
//! the clamped day counts are summed. Stays that do not touch the window are
//! left out of the result entirely.

use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::overlap;
use crate::rule::Rule;
use crate::stay::Stay;

/// The trailing window a compliance snapshot was measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookbackWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A stay after clamping to a lookback window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClampedStay {
    pub clamped_entry: NaiveDate,
    pub clamped_exit: NaiveDate,
    pub days_in_window: i64,
    pub original_entry: NaiveDate,
    /// `None` for a stay that is still open.
    pub original_exit: Option<NaiveDate>,
    pub country: String,
}

/// Compliance snapshot as of one reference date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub days_used: i64,
    /// `max(0, max_days - days_used)`.
    pub days_remaining: i64,
    pub is_compliant: bool,
    pub lookback_window: LookbackWindow,
    /// Stays that overlap the window, in input order.
    pub relevant_stays: Vec<ClampedStay>,
}

impl ComplianceResult {
    /// Number of days by which the allowance is exceeded (0 when compliant).
    pub fn days_over(&self, rule: &Rule) -> i64 {
        (self.days_used - rule.max_days()).max(0)
    }
}

impl Rule {
    /// The lookback window ending on `reference_date`.
    pub fn lookback_window(&self, reference_date: NaiveDate) -> LookbackWindow {
        // Saturates at the earliest representable date.
        let start = TimeDelta::try_days(self.lookback_offset())
            .and_then(|offset| reference_date.checked_sub_signed(offset))
            .unwrap_or(NaiveDate::MIN);
        LookbackWindow {
            start,
            end: reference_date,
        }
    }

    /// Evaluate `stays` as of `reference_date`.
    ///
    /// Open stays count as ongoing through `reference_date`. The result does
    /// not depend on the order of `stays` other than the order of
    /// `relevant_stays`.
    pub fn compliance(&self, stays: &[Stay], reference_date: NaiveDate) -> ComplianceResult {
        let window = self.lookback_window(reference_date);

        let relevant_stays: Vec<ClampedStay> = stays
            .iter()
            .filter_map(|stay| {
                let (clamped_entry, clamped_exit) = overlap::clamp_to_window(
                    stay.entry(),
                    stay.end_on(reference_date),
                    window.start,
                    window.end,
                )?;
                Some(ClampedStay {
                    clamped_entry,
                    clamped_exit,
                    days_in_window: overlap::inclusive_days(clamped_entry, clamped_exit),
                    original_entry: stay.entry(),
                    original_exit: stay.exit(),
                    country: stay.country().to_string(),
                })
            })
            .collect();

        let days_used: i64 = relevant_stays.iter().map(|s| s.days_in_window).sum();
        let days_remaining = (self.max_days() - days_used).max(0);

        tracing::trace!(
            %reference_date,
            stays = stays.len(),
            relevant = relevant_stays.len(),
            days_used,
            "evaluated compliance"
        );

        ComplianceResult {
            days_used,
            days_remaining,
            is_compliant: days_used <= self.max_days(),
            lookback_window: window,
            relevant_stays,
        }
    }
}

/// Evaluate `stays` against the standard 90/180 rule as of `reference_date`.
pub fn calculate_compliance(stays: &[Stay], reference_date: NaiveDate) -> ComplianceResult {
    Rule::default().compliance(stays, reference_date)
}
