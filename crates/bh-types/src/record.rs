use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Date format accepted for `diagnosedDate` (HTML date input format).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Treatment status of a diagnosed condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryStatus {
    Treated,
    Ongoing,
}

impl fmt::Display for HistoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Treated => write!(f, "Treated"),
            Self::Ongoing => write!(f, "Ongoing"),
        }
    }
}

impl FromStr for HistoryStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "treated" => Ok(Self::Treated),
            "ongoing" => Ok(Self::Ongoing),
            _ => Err(ValidationError::InvalidStatus(s.to_string())),
        }
    }
}

/// One diagnosed condition in a patient's medical history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub disease: String,
    pub diagnosed_date: NaiveDate,
    pub status: HistoryStatus,
}

impl HistoryEntry {
    pub fn new(disease: impl Into<String>, diagnosed_date: NaiveDate, status: HistoryStatus) -> Self {
        Self {
            disease: disease.into(),
            diagnosed_date,
            status,
        }
    }
}

/// An unvalidated medical-history submission, as it arrives from a form.
///
/// Every field is optional here; [`HistoryEntryDraft::validate`] is the only
/// way to obtain a [`HistoryEntry`] from it. Empty and whitespace-only
/// strings count as missing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryDraft {
    pub disease: Option<String>,
    pub diagnosed_date: Option<String>,
    pub status: Option<String>,
}

impl HistoryEntryDraft {
    pub fn new(
        disease: impl Into<String>,
        diagnosed_date: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            disease: Some(disease.into()),
            diagnosed_date: Some(diagnosed_date.into()),
            status: Some(status.into()),
        }
    }

    /// Check every required field and build the entry.
    pub fn validate(&self) -> Result<HistoryEntry, ValidationError> {
        let disease = required(&self.disease, "disease")?;
        let date = required(&self.diagnosed_date, "diagnosedDate")?;
        let status = required(&self.status, "status")?;

        let diagnosed_date = NaiveDate::parse_from_str(date, DATE_FORMAT)
            .map_err(|_| ValidationError::InvalidDate(date.to_string()))?;
        let status = status.parse()?;

        Ok(HistoryEntry::new(disease, diagnosed_date, status))
    }
}

fn required<'a>(
    value: &'a Option<String>,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField(field)),
    }
}

/// Demographic part of a patient record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl PatientProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// The document stored behind a patient's pointer.
///
/// Records are values: an update builds a new `PatientRecord` and stores it
/// under a new address. `medical_history` is in append order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub profile: PatientProfile,
    #[serde(default)]
    pub medical_history: Vec<HistoryEntry>,
}

impl PatientRecord {
    /// A freshly registered record with no history.
    pub fn new(profile: PatientProfile) -> Self {
        Self {
            profile,
            medical_history: Vec::new(),
        }
    }

    /// Return a new record with `entry` appended to the history.
    pub fn with_entry(mut self, entry: HistoryEntry) -> Self {
        self.medical_history.push(entry);
        self
    }

    /// Schema check applied before a record is written.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.profile.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if let Some(index) = self
            .medical_history
            .iter()
            .position(|e| e.disease.trim().is_empty())
        {
            return Err(ValidationError::IncompleteEntry { index });
        }
        Ok(())
    }

    /// Check that `self` only appends to `prior`'s history.
    ///
    /// Prior entries must survive unchanged and in order.
    pub fn extends(&self, prior: &PatientRecord) -> Result<(), ValidationError> {
        if self.medical_history.starts_with(&prior.medical_history) {
            Ok(())
        } else {
            Err(ValidationError::HistoryRewritten {
                prior_len: prior.medical_history.len(),
                new_len: self.medical_history.len(),
            })
        }
    }
}

/// A record or submission that does not satisfy the schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid diagnosed date {0:?}: expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid status {0:?}: expected Treated or Ongoing")]
    InvalidStatus(String),

    #[error("history entry {index} is missing its disease")]
    IncompleteEntry { index: usize },

    #[error("edit rewrote history: {prior_len} prior entries are not a prefix of the {new_len} new ones")]
    HistoryRewritten { prior_len: usize, new_len: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn draft_validates_into_entry() {
        let entry = HistoryEntryDraft::new("flu", "2024-01-15", "Treated")
            .validate()
            .unwrap();
        assert_eq!(entry.disease, "flu");
        assert_eq!(entry.diagnosed_date, date("2024-01-15"));
        assert_eq!(entry.status, HistoryStatus::Treated);
    }

    #[test]
    fn draft_missing_fields() {
        let mut draft = HistoryEntryDraft::new("flu", "2024-01-15", "Ongoing");
        draft.disease = None;
        assert_eq!(draft.validate(), Err(ValidationError::MissingField("disease")));

        let mut draft = HistoryEntryDraft::new("flu", "2024-01-15", "Ongoing");
        draft.diagnosed_date = Some("   ".into());
        assert_eq!(
            draft.validate(),
            Err(ValidationError::MissingField("diagnosedDate"))
        );

        let mut draft = HistoryEntryDraft::new("flu", "2024-01-15", "Ongoing");
        draft.status = Some(String::new());
        assert_eq!(draft.validate(), Err(ValidationError::MissingField("status")));
    }

    #[test]
    fn draft_bad_date_and_status() {
        let err = HistoryEntryDraft::new("flu", "15/01/2024", "Treated")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidDate(_)));

        let err = HistoryEntryDraft::new("flu", "2024-01-15", "Cured")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidStatus(_)));
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!("ongoing".parse::<HistoryStatus>().unwrap(), HistoryStatus::Ongoing);
        assert_eq!(" TREATED ".parse::<HistoryStatus>().unwrap(), HistoryStatus::Treated);
    }

    #[test]
    fn record_requires_name() {
        let record = PatientRecord::new(PatientProfile::new(" "));
        assert_eq!(record.validate(), Err(ValidationError::MissingField("name")));
    }

    #[test]
    fn record_rejects_blank_disease() {
        let record = PatientRecord::new(PatientProfile::new("Ada"))
            .with_entry(HistoryEntry::new("flu", date("2024-01-01"), HistoryStatus::Treated))
            .with_entry(HistoryEntry::new("", date("2024-02-01"), HistoryStatus::Ongoing));
        assert_eq!(
            record.validate(),
            Err(ValidationError::IncompleteEntry { index: 1 })
        );
    }

    #[test]
    fn extends_accepts_append() {
        let prior = PatientRecord::new(PatientProfile::new("Ada"))
            .with_entry(HistoryEntry::new("flu", date("2024-01-01"), HistoryStatus::Treated));
        let next = prior
            .clone()
            .with_entry(HistoryEntry::new("fracture", date("2024-03-01"), HistoryStatus::Ongoing));
        assert!(next.extends(&prior).is_ok());
    }

    #[test]
    fn extends_rejects_removal_and_edit() {
        let prior = PatientRecord::new(PatientProfile::new("Ada"))
            .with_entry(HistoryEntry::new("flu", date("2024-01-01"), HistoryStatus::Ongoing));

        let removed = PatientRecord::new(PatientProfile::new("Ada"));
        assert!(matches!(
            removed.extends(&prior),
            Err(ValidationError::HistoryRewritten { prior_len: 1, new_len: 0 })
        ));

        let mut edited = prior.clone();
        edited.medical_history[0].status = HistoryStatus::Treated;
        assert!(edited.extends(&prior).is_err());
    }

    #[test]
    fn json_uses_camel_case_keys() {
        let record = PatientRecord::new(PatientProfile::new("Ada"))
            .with_entry(HistoryEntry::new("flu", date("2024-01-15"), HistoryStatus::Treated));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["medicalHistory"][0]["diagnosedDate"], "2024-01-15");
        assert_eq!(json["medicalHistory"][0]["status"], "Treated");
        assert!(json["profile"].get("email").is_none());
    }

    #[test]
    fn missing_history_defaults_to_empty() {
        let record: PatientRecord =
            serde_json::from_str(r#"{"profile":{"name":"Ada"}}"#).unwrap();
        assert!(record.medical_history.is_empty());
    }
}
