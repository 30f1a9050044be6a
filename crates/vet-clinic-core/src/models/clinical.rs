//! Problem list and medical note models.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::appointment::MINUTE_FORMAT;

/// Problem status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProblemStatus {
    #[default]
    Active,
    Resolved,
}

impl ProblemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemStatus::Active => "active",
            ProblemStatus::Resolved => "resolved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ProblemStatus::Active),
            "resolved" => Some(ProblemStatus::Resolved),
            _ => None,
        }
    }
}

/// An entry on a patient's master problem list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Problem {
    pub id: String,
    /// Problem description
    pub name: String,
    pub patient_id: String,
    pub status: ProblemStatus,
    pub onset_date: NaiveDate,
    /// Always set while resolved
    pub resolved_date: Option<NaiveDate>,
    /// ICD-10 or other diagnostic code
    pub diagnosis_code: Option<String>,
    pub notes: Option<String>,
    pub active: bool,
}

impl Problem {
    pub fn new(name: String, patient_id: String, onset_date: NaiveDate) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            patient_id,
            status: ProblemStatus::Active,
            onset_date,
            resolved_date: None,
            diagnosis_code: None,
            notes: None,
            active: true,
        }
    }

    /// Change status, filling or clearing the resolved date to match.
    pub fn set_status(&mut self, status: ProblemStatus, today: NaiveDate) {
        self.status = status;
        match status {
            ProblemStatus::Resolved => {
                if self.resolved_date.is_none() {
                    self.resolved_date = Some(today);
                }
            }
            ProblemStatus::Active => self.resolved_date = None,
        }
    }

    /// Resolve as of `today`.
    pub fn mark_resolved(&mut self, today: NaiveDate) {
        self.status = ProblemStatus::Resolved;
        self.resolved_date = Some(today);
    }

    /// Reopen the problem.
    pub fn mark_active(&mut self) {
        self.status = ProblemStatus::Active;
        self.resolved_date = None;
    }
}

/// Medical note type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NoteType {
    Soap,
    Communication,
    #[default]
    Internal,
    Result,
    Image,
    Report,
}

impl NoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteType::Soap => "soap",
            NoteType::Communication => "communication",
            NoteType::Internal => "internal",
            NoteType::Result => "result",
            NoteType::Image => "image",
            NoteType::Report => "report",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "soap" => Some(NoteType::Soap),
            "communication" => Some(NoteType::Communication),
            "internal" => Some(NoteType::Internal),
            "result" => Some(NoteType::Result),
            "image" => Some(NoteType::Image),
            "report" => Some(NoteType::Report),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NoteType::Soap => "SOAP Note",
            NoteType::Communication => "Communication",
            NoteType::Internal => "Internal Note",
            NoteType::Result => "Diagnostic Result",
            NoteType::Image => "Image/Photo",
            NoteType::Report => "Report",
        }
    }
}

/// A clinical note in a patient's medical record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicalNote {
    pub id: String,
    pub patient_id: String,
    /// Appointment the note was written during
    pub appointment_id: Option<String>,
    pub date: NaiveDateTime,
    /// Provider ID of the author
    pub author_id: String,
    pub note_type: NoteType,
    /// SOAP: what the owner reports
    pub subjective: Option<String>,
    /// SOAP: examination findings
    pub objective: Option<String>,
    /// SOAP: diagnosis or differentials
    pub assessment: Option<String>,
    /// SOAP: treatment plan and follow-up
    pub plan: Option<String>,
    /// Free-form content for non-SOAP notes
    pub content: Option<String>,
    /// Visible to clinic staff only
    pub is_private: bool,
    pub is_important: bool,
    pub active: bool,
}

impl MedicalNote {
    pub fn new(
        patient_id: String,
        author_id: String,
        note_type: NoteType,
        date: NaiveDateTime,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            appointment_id: None,
            date,
            author_id,
            note_type,
            subjective: None,
            objective: None,
            assessment: None,
            plan: None,
            content: None,
            is_private: false,
            is_important: false,
            active: true,
        }
    }

    /// Note title: "{type label} - {patient} - {YYYY-MM-DD HH:MM}".
    pub fn title(&self, patient_name: &str) -> String {
        format!(
            "{} - {} - {}",
            self.note_type.label(),
            patient_name,
            self.date.format(MINUTE_FORMAT)
        )
    }
}
