//! Appointment models.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Minute-precision format used in references and warnings.
pub const MINUTE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Longest bookable duration, in hours (a leap year).
pub const MAX_DURATION_HOURS: f64 = 24.0 * 366.0;

/// Whether `hours` is a usable booking length.
pub fn is_valid_duration(hours: f64) -> bool {
    hours.is_finite() && hours > 0.0 && hours <= MAX_DURATION_HOURS
}

/// Convert a duration in (fractional) hours to a chrono duration.
///
/// Rounded to the millisecond; negative and non-finite values count as zero.
pub fn hours_to_duration(hours: f64) -> Duration {
    if !hours.is_finite() || hours <= 0.0 {
        return Duration::zero();
    }
    Duration::milliseconds((hours * 3_600_000.0).round() as i64)
}

/// Appointment lifecycle state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentState {
    #[default]
    Scheduled,
    Confirmed,
    InProgress,
    Done,
    Cancelled,
}

impl AppointmentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentState::Scheduled => "scheduled",
            AppointmentState::Confirmed => "confirmed",
            AppointmentState::InProgress => "in_progress",
            AppointmentState::Done => "done",
            AppointmentState::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(AppointmentState::Scheduled),
            "confirmed" => Some(AppointmentState::Confirmed),
            "in_progress" => Some(AppointmentState::InProgress),
            "done" => Some(AppointmentState::Done),
            "cancelled" => Some(AppointmentState::Cancelled),
            _ => None,
        }
    }

    /// Whether appointments in this state take part in conflict detection.
    pub fn is_active(&self) -> bool {
        !matches!(self, AppointmentState::Done | AppointmentState::Cancelled)
    }
}

/// Kind of visit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentKind {
    #[default]
    Checkup,
    Vaccination,
    Surgery,
    Emergency,
    Followup,
    Other,
}

impl AppointmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentKind::Checkup => "checkup",
            AppointmentKind::Vaccination => "vaccination",
            AppointmentKind::Surgery => "surgery",
            AppointmentKind::Emergency => "emergency",
            AppointmentKind::Followup => "followup",
            AppointmentKind::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "checkup" => Some(AppointmentKind::Checkup),
            "vaccination" => Some(AppointmentKind::Vaccination),
            "surgery" => Some(AppointmentKind::Surgery),
            "emergency" => Some(AppointmentKind::Emergency),
            "followup" => Some(AppointmentKind::Followup),
            "other" => Some(AppointmentKind::Other),
            _ => None,
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            AppointmentKind::Checkup => "Regular Checkup",
            AppointmentKind::Vaccination => "Vaccination",
            AppointmentKind::Surgery => "Surgery",
            AppointmentKind::Emergency => "Emergency",
            AppointmentKind::Followup => "Follow-up",
            AppointmentKind::Other => "Other",
        }
    }
}

/// A scheduled visit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    /// Unique appointment ID
    pub id: String,
    /// Generated reference, e.g. "Max - Vaccination - 2025-12-01 10:00"
    pub name: String,
    /// Patient ID (required)
    pub patient_id: String,
    pub kind: AppointmentKind,
    /// Optional booking type; its name takes precedence over `kind` in references
    pub booking_type_id: Option<String>,
    /// Start timestamp (clinic local time)
    pub start: NaiveDateTime,
    /// Duration in hours
    pub duration_hours: f64,
    /// Assigned provider ID
    pub provider_id: Option<String>,
    /// Assigned room ID
    pub room_id: Option<String>,
    /// Resolved resource combination for the room/provider pair
    pub combination_id: Option<String>,
    pub state: AppointmentState,
    /// Reason for visit
    pub reason: Option<String>,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub prescription: Option<String>,
    /// Additional notes
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Appointment {
    /// Create a new appointment with required fields.
    pub fn new(patient_id: String, start: NaiveDateTime, duration_hours: f64) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: String::new(),
            patient_id,
            kind: AppointmentKind::Checkup,
            booking_type_id: None,
            start,
            duration_hours,
            provider_id: None,
            room_id: None,
            combination_id: None,
            state: AppointmentState::Scheduled,
            reason: None,
            diagnosis: None,
            treatment: None,
            prescription: None,
            notes: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// End timestamp (start + duration), or `None` past the calendar's range.
    pub fn checked_end(&self) -> Option<NaiveDateTime> {
        self.start
            .checked_add_signed(hours_to_duration(self.duration_hours))
    }

    /// End timestamp (start + duration). Falls back to the start when the end
    /// is not representable.
    pub fn end(&self) -> NaiveDateTime {
        self.checked_end().unwrap_or(self.start)
    }

    /// Whether this appointment takes part in conflict detection.
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// A scheduled appointment may not start before `now`.
    pub fn violates_past_start(&self, now: NaiveDateTime) -> bool {
        self.state == AppointmentState::Scheduled && self.start < now
    }

    /// Display name: "{patient} - {owner}" when both are known, else the reference.
    pub fn display_name(&self, patient_name: Option<&str>, owner_name: Option<&str>) -> String {
        match (patient_name, owner_name) {
            (Some(patient), Some(owner)) => format!("{} - {}", patient, owner),
            _ if !self.name.is_empty() => self.name.clone(),
            _ => "New".to_string(),
        }
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}
