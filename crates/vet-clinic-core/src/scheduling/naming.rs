//! Human-readable appointment references.

use chrono::NaiveDateTime;

use crate::models::MINUTE_FORMAT;

/// Fallback reference when no part is known.
pub const DEFAULT_REFERENCE: &str = "Appointment";

/// Build a reference like "Max - Vaccination - 2025-12-01 10:00".
///
/// Parts that are absent (or blank) are skipped.
pub fn generate_reference(
    patient_name: Option<&str>,
    type_label: Option<&str>,
    start: Option<NaiveDateTime>,
) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(3);
    if let Some(patient) = patient_name.filter(|s| !s.trim().is_empty()) {
        parts.push(patient.to_string());
    }
    if let Some(label) = type_label.filter(|s| !s.trim().is_empty()) {
        parts.push(label.to_string());
    }
    if let Some(start) = start {
        parts.push(start.format(MINUTE_FORMAT).to_string());
    }

    if parts.is_empty() {
        DEFAULT_REFERENCE.to_string()
    } else {
        parts.join(" - ")
    }
}

/// Whether a stored reference is a placeholder that should be regenerated.
pub fn is_placeholder_reference(name: &str) -> bool {
    let name = name.trim();
    name.is_empty() || name == "New"
}
