//! Appointment create/update workflow and state actions.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::{
    generate_reference, is_placeholder_reference, CombinationResolver, OverlapCandidate,
    OverlapDetector, OverlapReport, SchedulingError, SchedulingResult,
};
use crate::config::ClinicConfig;
use crate::db::{Database, DbResult};
use crate::models::{is_valid_duration, Appointment, AppointmentState, BookingType};

/// Overlap flag plus rendered warning for one booking.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverlapStatus {
    pub report: OverlapReport,
    pub warning: Option<String>,
}

impl OverlapStatus {
    pub fn has_overlap(&self) -> bool {
        self.report.has_overlap()
    }
}

/// Coordinates validation, combination resolution and reference generation
/// around appointment writes.
pub struct AppointmentService<'a> {
    db: &'a Database,
    config: ClinicConfig,
    now: Option<NaiveDateTime>,
}

impl<'a> AppointmentService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self::with_config(db, ClinicConfig::default())
    }

    pub fn with_config(db: &'a Database, config: ClinicConfig) -> Self {
        Self {
            db,
            config,
            now: None,
        }
    }

    /// Pin the clock used for past-start validation.
    pub fn at(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    fn now(&self) -> NaiveDateTime {
        self.now
            .unwrap_or_else(|| chrono::Local::now().naive_local())
    }

    /// A new unsaved appointment with the duration of its booking type, or the
    /// configured default.
    pub fn draft_appointment(
        &self,
        patient_id: String,
        start: NaiveDateTime,
        booking_type: Option<&BookingType>,
    ) -> Appointment {
        let duration = booking_type
            .map(|t| t.duration_hours)
            .filter(|hours| *hours > 0.0)
            .unwrap_or(self.config.default_duration_hours);
        let mut appt = Appointment::new(patient_id, start, duration);
        appt.booking_type_id = booking_type.map(|t| t.id.clone());
        appt
    }

    fn validate_duration(&self, appt: &Appointment) -> SchedulingResult<()> {
        if !is_valid_duration(appt.duration_hours) {
            tracing::warn!(
                appointment_id = %appt.id,
                duration_hours = appt.duration_hours,
                "Rejected appointment duration"
            );
            return Err(SchedulingError::InvalidDuration(appt.duration_hours));
        }
        Ok(())
    }

    fn validate(&self, appt: &Appointment) -> SchedulingResult<()> {
        let now = self.now();
        if appt.violates_past_start(now) {
            tracing::warn!(
                appointment_id = %appt.id,
                start = %appt.start,
                "Rejected scheduled appointment starting in the past"
            );
            return Err(SchedulingError::StartInPast {
                start: appt.start,
                now,
            });
        }
        Ok(())
    }

    /// Booking type name, or the appointment kind label without one.
    fn type_label(&self, appt: &Appointment) -> DbResult<String> {
        if let Some(type_id) = &appt.booking_type_id {
            if let Some(booking_type) = self.db.get_booking_type(type_id)? {
                return Ok(booking_type.name);
            }
        }
        Ok(appt.kind.label().to_string())
    }

    fn reference_for(&self, appt: &Appointment) -> DbResult<String> {
        let patient_name = self.db.get_patient(&appt.patient_id)?.map(|p| p.name);
        let label = self.type_label(appt)?;
        Ok(generate_reference(
            patient_name.as_deref(),
            Some(label.as_str()),
            Some(appt.start),
        ))
    }

    /// Resolve the room/provider combination and make it selectable for the booking type.
    fn apply_combination(&self, appt: &mut Appointment) -> DbResult<()> {
        let combination = CombinationResolver::new(self.db)
            .resolve_for_ids(appt.room_id.as_deref(), appt.provider_id.as_deref())?;
        appt.combination_id = combination.map(|c| c.id);

        if let (Some(type_id), Some(combination_id)) = (&appt.booking_type_id, &appt.combination_id) {
            self.db
                .link_type_combination(type_id, combination_id, self.config.type_link_sequence)?;
        }
        Ok(())
    }

    /// Validate, resolve, name and insert a new appointment.
    pub fn create_appointment(&self, mut appt: Appointment) -> SchedulingResult<Appointment> {
        self.validate_duration(&appt)?;
        self.validate(&appt)?;

        self.db.with_savepoint("create_appointment", || {
            self.apply_combination(&mut appt)?;
            appt.name = self.reference_for(&appt)?;
            self.db.insert_appointment(&appt)?;
            tracing::info!(appointment_id = %appt.id, name = %appt.name, "Created appointment");
            Ok(appt)
        })
    }

    /// Validate and store changes, refreshing the derived fields whose inputs changed.
    pub fn update_appointment(&self, mut appt: Appointment) -> SchedulingResult<Appointment> {
        let existing = self
            .db
            .get_appointment(&appt.id)?
            .ok_or_else(|| SchedulingError::NotFound(format!("appointment {}", appt.id)))?;

        self.validate_duration(&appt)?;
        if appt.start != existing.start {
            self.validate(&appt)?;
        }

        let resources_changed = appt.provider_id != existing.provider_id
            || appt.room_id != existing.room_id
            || appt.booking_type_id != existing.booking_type_id;
        let reference_changed = appt.patient_id != existing.patient_id
            || appt.booking_type_id != existing.booking_type_id
            || appt.kind != existing.kind
            || appt.start != existing.start
            || is_placeholder_reference(&appt.name);

        self.db.with_savepoint("update_appointment", || {
            if resources_changed {
                self.apply_combination(&mut appt)?;
            }
            if reference_changed {
                appt.name = self.reference_for(&appt)?;
            }
            appt.touch();
            self.db.update_appointment(&appt)?;
            tracing::info!(appointment_id = %appt.id, name = %appt.name, "Updated appointment");
            Ok(appt)
        })
    }

    fn set_state(&self, appointment_id: &str, state: AppointmentState) -> SchedulingResult<()> {
        if !self.db.set_appointment_state(appointment_id, state)? {
            return Err(SchedulingError::NotFound(format!("appointment {}", appointment_id)));
        }
        tracing::info!(appointment_id, state = state.as_str(), "Appointment state changed");
        Ok(())
    }

    pub fn confirm(&self, appointment_id: &str) -> SchedulingResult<()> {
        self.set_state(appointment_id, AppointmentState::Confirmed)
    }

    pub fn start(&self, appointment_id: &str) -> SchedulingResult<()> {
        self.set_state(appointment_id, AppointmentState::InProgress)
    }

    pub fn complete(&self, appointment_id: &str) -> SchedulingResult<()> {
        self.set_state(appointment_id, AppointmentState::Done)
    }

    /// Cancel from any state.
    pub fn cancel(&self, appointment_id: &str) -> SchedulingResult<()> {
        self.set_state(appointment_id, AppointmentState::Cancelled)
    }

    /// Conflicts for an unsaved or edited booking.
    pub fn check_candidate(&self, candidate: &OverlapCandidate) -> SchedulingResult<OverlapStatus> {
        let detector = OverlapDetector::new(self.db);
        let report = detector.detect_overlaps(candidate)?;
        let warning = detector.warning(&report)?;
        Ok(OverlapStatus { report, warning })
    }

    /// Conflicts for a stored appointment, as it is now.
    pub fn overlap_report(&self, appointment_id: &str) -> SchedulingResult<OverlapStatus> {
        let appt = self
            .db
            .get_appointment(appointment_id)?
            .ok_or_else(|| SchedulingError::NotFound(format!("appointment {}", appointment_id)))?;
        self.check_candidate(&OverlapCandidate::from(&appt))
    }
}
