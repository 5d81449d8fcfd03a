//! Check a planned future trip against the allowance.
//!
//! Two snapshots are taken:
//!
//! - **entry** — compliance on the planned entry day over the existing stays
//!   only, i.e. the allowance available when walking in;
//! - **exit** — compliance on the planned exit day with the planned trip
//!   appended, i.e. usage after the whole trip.
//!
//! The verdict compares the entry allowance with the trip length. Warnings are
//! evaluated independently and always emitted in the same order.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::compliance::ComplianceResult;
use crate::error::Result;
use crate::rule::Rule;
use crate::stay::Stay;

/// A warning attached to a trip validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TripWarning {
    /// The allowance is already exceeded on the planned entry day.
    LimitExceeded { days_used: i64, max_days: i64 },
    /// The trip is longer than the allowance available on entry.
    InsufficientDays { days_available: i64, trip_duration: i64 },
    /// Allowance on entry is below the moderate threshold.
    LowAllowance { days_remaining: i64 },
    /// Allowance on entry is below the critical threshold.
    CriticalAllowance { days_remaining: i64 },
}

impl fmt::Display for TripWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TripWarning::LimitExceeded {
                days_used,
                max_days,
            } => write!(
                f,
                "You have already exceeded the {}-day limit ({} days used)",
                max_days, days_used
            ),
            TripWarning::InsufficientDays {
                days_available,
                trip_duration,
            } => write!(
                f,
                "Insufficient days available: the trip needs {} days but only {} are available",
                trip_duration, days_available
            ),
            TripWarning::LowAllowance { days_remaining } => write!(
                f,
                "Only {} days remaining in the current window",
                days_remaining
            ),
            TripWarning::CriticalAllowance { days_remaining } => write!(
                f,
                "Critical: only {} days remaining, plan carefully",
                days_remaining
            ),
        }
    }
}

/// Verdict for a planned trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripValidationResult {
    pub is_valid: bool,
    /// Inclusive length of the planned trip.
    pub trip_duration: i64,
    pub days_available_on_entry: i64,
    pub days_used_on_exit: i64,
    pub warnings: Vec<TripWarning>,
    pub entry_compliance: ComplianceResult,
    pub exit_compliance: ComplianceResult,
}

impl TripValidationResult {
    /// Warnings rendered as display strings, in order.
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}

impl Rule {
    /// Validate a trip from `planned_entry` through `planned_exit` in `country`.
    ///
    /// # Errors
    /// Returns `EngineError::InvertedStay` if `planned_entry > planned_exit`.
    pub fn validate_trip(
        &self,
        stays: &[Stay],
        planned_entry: NaiveDate,
        planned_exit: NaiveDate,
        country: &str,
    ) -> Result<TripValidationResult> {
        let planned = Stay::new(country, planned_entry, planned_exit)?;
        let trip_duration = planned.duration_days(planned_exit);

        let entry_compliance = self.compliance(stays, planned_entry);

        let mut with_trip = stays.to_vec();
        with_trip.push(planned);
        let exit_compliance = self.compliance(&with_trip, planned_exit);

        let remaining = entry_compliance.days_remaining;
        let mut warnings = Vec::new();

        if !entry_compliance.is_compliant {
            warnings.push(TripWarning::LimitExceeded {
                days_used: entry_compliance.days_used,
                max_days: self.max_days(),
            });
        }
        if remaining < trip_duration {
            warnings.push(TripWarning::InsufficientDays {
                days_available: remaining,
                trip_duration,
            });
        }
        if remaining > 0 && remaining < self.moderate_warning_days() {
            warnings.push(TripWarning::LowAllowance {
                days_remaining: remaining,
            });
        }
        if remaining > 0 && remaining < self.critical_warning_days() {
            warnings.push(TripWarning::CriticalAllowance {
                days_remaining: remaining,
            });
        }

        let is_valid = remaining >= trip_duration;
        tracing::debug!(
            %planned_entry,
            %planned_exit,
            country,
            trip_duration,
            days_available = remaining,
            is_valid,
            warnings = warnings.len(),
            "validated planned trip"
        );

        Ok(TripValidationResult {
            is_valid,
            trip_duration,
            days_available_on_entry: remaining,
            days_used_on_exit: exit_compliance.days_used,
            warnings,
            entry_compliance,
            exit_compliance,
        })
    }
}

/// Validate a planned trip under the standard 90/180 rule.
///
/// # Errors
/// Returns `EngineError::InvertedStay` if `planned_entry > planned_exit`.
pub fn validate_planned_trip(
    stays: &[Stay],
    planned_entry: NaiveDate,
    planned_exit: NaiveDate,
    country: &str,
) -> Result<TripValidationResult> {
    Rule::default().validate_trip(stays, planned_entry, planned_exit, country)
}
