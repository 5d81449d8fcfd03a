//! # schengen-engine
//!
//! Deterministic calculations for the rolling "90 days in any 180-day period"
//! stay allowance.
//!
//! Every operation is a pure function of its arguments: the reference date is
//! always passed explicitly, so results never depend on the system clock.
//!
//! ## Modules
//!
//! - [`overlap`] — Clamp a date range to a window and count shared days
//! - [`compliance`] — Days used/remaining as of a reference date
//! - [`next_entry`] — Earliest future date with allowance to spare
//! - [`trip`] — Validate a planned trip and produce warnings
//! - [`monthly`] — Days used per calendar month
//! - [`usage`] — Caller-owned recorder of anonymized snapshots
//! - [`rule`] — Rule parameters (90/180 by default)
//! - [`stay`] — The validated `Stay` input record
//! - [`error`] — Error types

pub mod compliance;
pub mod error;
pub mod monthly;
pub mod next_entry;
pub mod overlap;
pub mod rule;
pub mod stay;
pub mod trip;
pub mod usage;

pub use compliance::{calculate_compliance, ClampedStay, ComplianceResult, LookbackWindow};
pub use error::EngineError;
pub use monthly::{monthly_breakdown, MonthTripDays, MonthUsage, MonthlyBreakdown};
pub use next_entry::{find_next_possible_entry, NextEntryResult};
pub use overlap::overlap_days;
pub use rule::Rule;
pub use stay::Stay;
pub use trip::{validate_planned_trip, TripValidationResult, TripWarning};
pub use usage::{ClientMetadata, ExportFormat, UsageRecorder, UsageSnapshot, UsageSummary};
