//! Provider and room double-booking detection.
//!
//! Two appointments conflict when their half-open windows intersect
//! (`a.start < b.end && b.start < a.end`) and they share a provider or a room.
//! Only appointments that are neither done nor cancelled take part.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::db::{Database, DbResult};
use crate::models::{hours_to_duration, Appointment, MINUTE_FORMAT};

/// The booking being checked. Any field may still be missing while a form is
/// being filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlapCandidate {
    /// Set once the appointment is stored; excluded from its own scan
    pub id: Option<String>,
    pub start: Option<NaiveDateTime>,
    pub duration_hours: Option<f64>,
    pub provider_id: Option<String>,
    pub room_id: Option<String>,
}

impl OverlapCandidate {
    /// Half-open time window, if start and a positive duration are known and
    /// the end is representable.
    pub fn window(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let start = self.start?;
        let duration = hours_to_duration(self.duration_hours?);
        if duration <= chrono::Duration::zero() {
            return None;
        }
        Some((start, start.checked_add_signed(duration)?))
    }
}

impl From<&Appointment> for OverlapCandidate {
    fn from(appt: &Appointment) -> Self {
        Self {
            id: Some(appt.id.clone()),
            start: Some(appt.start),
            duration_hours: Some(appt.duration_hours),
            provider_id: appt.provider_id.clone(),
            room_id: appt.room_id.clone(),
        }
    }
}

/// Conflicting appointments, each list ordered by start descending then id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverlapReport {
    pub provider_conflicts: Vec<Appointment>,
    pub room_conflicts: Vec<Appointment>,
}

impl OverlapReport {
    pub fn has_overlap(&self) -> bool {
        !self.provider_conflicts.is_empty() || !self.room_conflicts.is_empty()
    }

    /// Serialize for export.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Minimal HTML escaping for names embedded in the warning block.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Render the warning block shown next to a conflicting booking.
///
/// `patient_name` resolves a patient ID to a display name. Returns `None`
/// when there is nothing to warn about.
pub fn render_warning<F>(report: &OverlapReport, patient_name: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    if !report.has_overlap() {
        return None;
    }

    let entry = |appt: &Appointment| {
        let patient = patient_name(&appt.patient_id).unwrap_or_default();
        format!(
            "  • {} - {} ({})",
            escape_html(&appt.name),
            appt.start.format(MINUTE_FORMAT),
            escape_html(&patient)
        )
    };

    let mut lines = Vec::new();
    if !report.provider_conflicts.is_empty() {
        lines.push("<strong>Provider Overlap:</strong>".to_string());
        lines.extend(report.provider_conflicts.iter().map(&entry));
    }
    if !report.room_conflicts.is_empty() {
        lines.push("<strong>Room Overlap:</strong>".to_string());
        lines.extend(report.room_conflicts.iter().map(&entry));
    }

    Some(format!(
        "<div class=\"alert alert-warning\">{}</div>",
        lines.join("<br/>")
    ))
}

/// Finds appointments that double-book a provider or room.
pub struct OverlapDetector<'a> {
    db: &'a Database,
}

impl<'a> OverlapDetector<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Provider and room conflicts for a candidate booking.
    ///
    /// Incomplete candidates (no start, no duration, or neither provider nor
    /// room) have no conflicts.
    pub fn detect_overlaps(&self, candidate: &OverlapCandidate) -> DbResult<OverlapReport> {
        let Some((start, end)) = candidate.window() else {
            return Ok(OverlapReport::default());
        };
        if candidate.provider_id.is_none() && candidate.room_id.is_none() {
            return Ok(OverlapReport::default());
        }

        let others = self.db.list_active_appointments_starting_before(
            &end,
            candidate.id.as_deref(),
            candidate.provider_id.as_deref(),
            candidate.room_id.as_deref(),
        )?;

        let mut report = OverlapReport::default();
        for other in others {
            match other.checked_end() {
                Some(other_end) if other_end > start => {}
                _ => continue,
            }
            let same_provider =
                candidate.provider_id.is_some() && other.provider_id == candidate.provider_id;
            let same_room = candidate.room_id.is_some() && other.room_id == candidate.room_id;

            match (same_provider, same_room) {
                (true, true) => {
                    report.provider_conflicts.push(other.clone());
                    report.room_conflicts.push(other);
                }
                (true, false) => report.provider_conflicts.push(other),
                (false, true) => report.room_conflicts.push(other),
                (false, false) => {}
            }
        }

        tracing::debug!(
            candidate = candidate.id.as_deref().unwrap_or("new"),
            provider_conflicts = report.provider_conflicts.len(),
            room_conflicts = report.room_conflicts.len(),
            "Overlap scan complete"
        );

        Ok(report)
    }

    /// Render the warning for a report, looking up patient names.
    pub fn warning(&self, report: &OverlapReport) -> DbResult<Option<String>> {
        if !report.has_overlap() {
            return Ok(None);
        }

        let mut names: HashMap<String, String> = HashMap::new();
        for appt in report.provider_conflicts.iter().chain(&report.room_conflicts) {
            if names.contains_key(&appt.patient_id) {
                continue;
            }
            if let Some(patient) = self.db.get_patient(&appt.patient_id)? {
                names.insert(appt.patient_id.clone(), patient.name);
            }
        }

        Ok(render_warning(report, |id| names.get(id).cloned()))
    }
}
