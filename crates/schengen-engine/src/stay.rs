//! The `Stay` input record.
//!
//! A stay is a date range spent inside the area, identified by the country of
//! entry. Stays are validated on construction: an entry after the exit is
//! rejected with [`EngineError::InvertedStay`], both through the constructors
//! and through serde deserialization, so the calculators never see an inverted
//! range.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::overlap;

/// A single stay. `exit == None` marks a stay that is still ongoing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StayRecord")]
pub struct Stay {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    country: String,
    entry: NaiveDate,
    exit: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

/// Unvalidated wire shape of a [`Stay`].
#[derive(Deserialize)]
struct StayRecord {
    #[serde(default)]
    id: Option<String>,
    country: String,
    entry: NaiveDate,
    #[serde(default)]
    exit: Option<NaiveDate>,
    #[serde(default)]
    notes: Option<String>,
}

impl TryFrom<StayRecord> for Stay {
    type Error = EngineError;

    fn try_from(record: StayRecord) -> Result<Self> {
        let stay = match record.exit {
            Some(exit) => Stay::new(record.country, record.entry, exit)?,
            None => Stay::open(record.country, record.entry),
        };
        Ok(Stay {
            id: record.id,
            notes: record.notes,
            ..stay
        })
    }
}

impl Stay {
    /// A closed stay from `entry` through `exit`, both days inclusive.
    ///
    /// # Errors
    /// Returns `EngineError::InvertedStay` if `entry > exit`.
    pub fn new(country: impl Into<String>, entry: NaiveDate, exit: NaiveDate) -> Result<Self> {
        if entry > exit {
            return Err(EngineError::InvertedStay { entry, exit });
        }
        Ok(Self {
            id: None,
            country: country.into(),
            entry,
            exit: Some(exit),
            notes: None,
        })
    }

    /// A stay that has started but not ended yet.
    pub fn open(country: impl Into<String>, entry: NaiveDate) -> Self {
        Self {
            id: None,
            country: country.into(),
            entry,
            exit: None,
            notes: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn entry(&self) -> NaiveDate {
        self.entry
    }

    pub fn exit(&self) -> Option<NaiveDate> {
        self.exit
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.exit.is_none()
    }

    /// Last day of the stay, with an open stay running through `today`.
    pub fn end_on(&self, today: NaiveDate) -> NaiveDate {
        self.exit.unwrap_or(today)
    }

    /// Inclusive length of the stay in days. An open stay that starts after
    /// `today` has length 0.
    pub fn duration_days(&self, today: NaiveDate) -> i64 {
        overlap::inclusive_days(self.entry, self.end_on(today))
    }
}
