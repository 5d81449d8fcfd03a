//! Parameters of the rolling allowance rule.
//!
//! The standard Schengen short-stay rule is "90 days in any 180-day period",
//! which is what [`Rule::default`] returns. Every operation in this crate is a
//! method on [`Rule`]; the free functions re-exported from the crate root use
//! the default rule.
//!
//! Custom rules are validated on construction (and on deserialization), so a
//! `Rule` value always describes a window that fits in a `NaiveDate` range.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Upper bound for window and search-horizon lengths: one century of days.
pub const MAX_RULE_DAYS: i64 = 36_525;

const DEFAULT_SEARCH_HORIZON_DAYS: i64 = 365;
const DEFAULT_MODERATE_WARNING_DAYS: i64 = 30;
const DEFAULT_CRITICAL_WARNING_DAYS: i64 = 10;

/// A rolling "N days out of any trailing M days" rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RuleRecord")]
pub struct Rule {
    max_days: i64,
    window_days: i64,
    search_horizon_days: i64,
    moderate_warning_days: i64,
    critical_warning_days: i64,
}

/// Unvalidated wire shape of a [`Rule`]; missing fields take the defaults.
#[derive(Deserialize)]
#[serde(default)]
struct RuleRecord {
    max_days: i64,
    window_days: i64,
    search_horizon_days: i64,
    moderate_warning_days: i64,
    critical_warning_days: i64,
}

impl Default for RuleRecord {
    fn default() -> Self {
        let rule = Rule::default();
        Self {
            max_days: rule.max_days,
            window_days: rule.window_days,
            search_horizon_days: rule.search_horizon_days,
            moderate_warning_days: rule.moderate_warning_days,
            critical_warning_days: rule.critical_warning_days,
        }
    }
}

impl TryFrom<RuleRecord> for Rule {
    type Error = EngineError;

    fn try_from(record: RuleRecord) -> Result<Self> {
        Rule::new(record.max_days, record.window_days)?
            .with_search_horizon(record.search_horizon_days)?
            .with_warning_thresholds(record.moderate_warning_days, record.critical_warning_days)
    }
}

impl Default for Rule {
    fn default() -> Self {
        Self {
            max_days: 90,
            window_days: 180,
            search_horizon_days: DEFAULT_SEARCH_HORIZON_DAYS,
            moderate_warning_days: DEFAULT_MODERATE_WARNING_DAYS,
            critical_warning_days: DEFAULT_CRITICAL_WARNING_DAYS,
        }
    }
}

impl Rule {
    /// A rule allowing `max_days` in any trailing `window_days`, with the
    /// default search horizon and warning thresholds.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidRule` unless
    /// `1 <= max_days <= window_days <= MAX_RULE_DAYS`.
    pub fn new(max_days: i64, window_days: i64) -> Result<Self> {
        if !(1..=MAX_RULE_DAYS).contains(&window_days) {
            return Err(EngineError::InvalidRule(format!(
                "window_days must be between 1 and {}, got {}",
                MAX_RULE_DAYS, window_days
            )));
        }
        if !(1..=window_days).contains(&max_days) {
            return Err(EngineError::InvalidRule(format!(
                "max_days must be between 1 and window_days ({}), got {}",
                window_days, max_days
            )));
        }
        Ok(Self {
            max_days,
            window_days,
            ..Self::default()
        })
    }

    /// Replace the number of candidate days the next-entry search inspects.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidRule` unless `1 <= days <= MAX_RULE_DAYS`.
    pub fn with_search_horizon(mut self, days: i64) -> Result<Self> {
        if !(1..=MAX_RULE_DAYS).contains(&days) {
            return Err(EngineError::InvalidRule(format!(
                "search_horizon_days must be between 1 and {}, got {}",
                MAX_RULE_DAYS, days
            )));
        }
        self.search_horizon_days = days;
        Ok(self)
    }

    /// Replace the low-allowance warning thresholds.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidRule` unless `0 <= critical <= moderate`.
    pub fn with_warning_thresholds(mut self, moderate: i64, critical: i64) -> Result<Self> {
        if critical < 0 || moderate < critical {
            return Err(EngineError::InvalidRule(format!(
                "warning thresholds must satisfy 0 <= critical <= moderate, got moderate {} and critical {}",
                moderate, critical
            )));
        }
        self.moderate_warning_days = moderate;
        self.critical_warning_days = critical;
        Ok(self)
    }

    /// Maximum number of days that may be used inside one window.
    pub fn max_days(&self) -> i64 {
        self.max_days
    }

    /// Length of the trailing window in calendar days, reference date included.
    pub fn window_days(&self) -> i64 {
        self.window_days
    }

    /// How many candidate days the next-entry search inspects before giving up.
    pub fn search_horizon_days(&self) -> i64 {
        self.search_horizon_days
    }

    /// Remaining allowance below which a planned trip gets a low-allowance warning.
    pub fn moderate_warning_days(&self) -> i64 {
        self.moderate_warning_days
    }

    /// Remaining allowance below which a planned trip gets a critical warning.
    pub fn critical_warning_days(&self) -> i64 {
        self.critical_warning_days
    }

    /// Days to subtract from a reference date to get the first day of its window.
    pub fn lookback_offset(&self) -> i64 {
        self.window_days - 1
    }
}
