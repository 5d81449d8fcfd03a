//! Anonymized usage snapshots of compliance results.
//!
//! A [`UsageRecorder`] is an append-only log owned by its caller. Each
//! recorded snapshot keeps only aggregate numbers from a [`ComplianceResult`]
//! (no dates, no countries) plus coarse client metadata, and the log can be
//! summarized or exported as JSON or CSV.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::compliance::ComplianceResult;
use crate::error::{EngineError, Result};
use crate::overlap;

/// Snapshots with more trips than this count as "many trips" in summaries.
const MANY_TRIPS_THRESHOLD: usize = 3;

/// Column header of the CSV export.
pub const CSV_HEADER: &str =
    "timestamp,session_id,days_used,days_remaining,is_compliant,trip_count,timezone";

/// Coarse information about the client that produced a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMetadata {
    /// IANA timezone name reported by the client, e.g. "Europe/Berlin".
    pub timezone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// One recorded compliance evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub days_used: i64,
    pub days_remaining: i64,
    pub is_compliant: bool,
    pub trip_count: usize,
    /// Mean full length (not clamped) of the stays inside the window.
    pub average_trip_length: f64,
    pub client: ClientMetadata,
}

/// Trip-length histogram keyed by average trip length per snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripLengthHistogram {
    #[serde(rename = "under_7")]
    pub short: usize,
    #[serde(rename = "7_to_30")]
    pub medium: usize,
    #[serde(rename = "over_30")]
    pub long: usize,
}

impl TripLengthHistogram {
    fn add(&mut self, average_length: f64) {
        if average_length < 7.0 {
            self.short += 1;
        } else if average_length <= 30.0 {
            self.medium += 1;
        } else {
            self.long += 1;
        }
    }
}

/// Aggregate statistics over all recorded snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub total_snapshots: usize,
    /// Fraction of snapshots that were compliant, in `[0, 1]`.
    pub compliance_rate: f64,
    pub average_days_used: f64,
    /// Only snapshots with at least one trip are bucketed.
    pub trip_length_histogram: TripLengthHistogram,
    pub histories_with_many_trips: usize,
    pub by_timezone: BTreeMap<String, usize>,
    /// Keyed by hour of day (0-23) of the snapshot timestamp in the client's
    /// timezone; unknown timezone names fall back to UTC.
    pub by_hour: BTreeMap<u32, usize>,
}

/// Output format of [`UsageRecorder::export`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Pretty-printed JSON of the [`UsageSummary`].
    #[default]
    Json,
    /// One CSV row per raw snapshot, under [`CSV_HEADER`].
    Csv,
}

impl FromStr for ExportFormat {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(EngineError::UnknownExportFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => f.write_str("json"),
            ExportFormat::Csv => f.write_str("csv"),
        }
    }
}

/// Append-only log of usage snapshots for one session.
#[derive(Debug, Clone)]
pub struct UsageRecorder {
    session_id: String,
    snapshots: Vec<UsageSnapshot>,
}

impl UsageRecorder {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            snapshots: Vec::new(),
        }
    }

    /// A recorder with a freshly generated random session id.
    pub fn with_random_session() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn snapshots(&self) -> &[UsageSnapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Drop every recorded snapshot, keeping the session id.
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    /// Append a snapshot of `result` taken at `timestamp`.
    pub fn record(
        &mut self,
        result: &ComplianceResult,
        client: ClientMetadata,
        timestamp: DateTime<Utc>,
    ) -> UsageSnapshot {
        let trip_count = result.relevant_stays.len();
        let average_trip_length = if trip_count == 0 {
            0.0
        } else {
            let window_end = result.lookback_window.end;
            let total: i64 = result
                .relevant_stays
                .iter()
                .map(|s| {
                    overlap::inclusive_days(s.original_entry, s.original_exit.unwrap_or(window_end))
                })
                .sum();
            total as f64 / trip_count as f64
        };

        let snapshot = UsageSnapshot {
            timestamp,
            session_id: self.session_id.clone(),
            days_used: result.days_used,
            days_remaining: result.days_remaining,
            is_compliant: result.is_compliant,
            trip_count,
            average_trip_length,
            client,
        };
        tracing::trace!(
            session_id = %self.session_id,
            days_used = snapshot.days_used,
            trip_count,
            "recorded usage snapshot"
        );
        self.snapshots.push(snapshot.clone());
        snapshot
    }

    /// Aggregate statistics over everything recorded so far.
    pub fn summarize(&self) -> UsageSummary {
        let total = self.snapshots.len();
        if total == 0 {
            return UsageSummary::default();
        }

        let mut summary = UsageSummary {
            total_snapshots: total,
            ..UsageSummary::default()
        };
        let mut compliant = 0usize;
        let mut days_used_sum = 0i64;

        for snapshot in &self.snapshots {
            if snapshot.is_compliant {
                compliant += 1;
            }
            days_used_sum += snapshot.days_used;
            if snapshot.trip_count > 0 {
                summary
                    .trip_length_histogram
                    .add(snapshot.average_trip_length);
            }
            if snapshot.trip_count > MANY_TRIPS_THRESHOLD {
                summary.histories_with_many_trips += 1;
            }
            *summary
                .by_timezone
                .entry(snapshot.client.timezone.clone())
                .or_default() += 1;
            *summary.by_hour.entry(local_hour(snapshot)).or_default() += 1;
        }

        summary.compliance_rate = compliant as f64 / total as f64;
        summary.average_days_used = days_used_sum as f64 / total as f64;
        summary
    }

    /// Render the log in the requested format.
    ///
    /// # Errors
    /// Returns `EngineError::Json` if the summary cannot be serialized, or
    /// `EngineError::Csv` if a CSV record cannot be written.
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Json => Ok(serde_json::to_string_pretty(&self.summarize())?),
            ExportFormat::Csv => self.to_csv(),
        }
    }

    /// Fields are quoted only when they contain a delimiter, quote or newline.
    fn to_csv(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        writer.write_record(CSV_HEADER.split(','))?;
        for s in &self.snapshots {
            writer.write_record([
                s.timestamp.to_rfc3339(),
                s.session_id.clone(),
                s.days_used.to_string(),
                s.days_remaining.to_string(),
                s.is_compliant.to_string(),
                s.trip_count.to_string(),
                s.client.timezone.clone(),
            ])?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Hour of day of `snapshot` in the client's timezone, falling back to UTC
/// when the timezone name is not a known IANA identifier.
fn local_hour(snapshot: &UsageSnapshot) -> u32 {
    match snapshot.client.timezone.parse::<Tz>() {
        Ok(tz) => snapshot.timestamp.with_timezone(&tz).hour(),
        Err(_) => snapshot.timestamp.hour(),
    }
}
