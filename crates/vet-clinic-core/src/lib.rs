//! Vet Clinic Core Library
//!
//! Local-first practice management core for a veterinary clinic: owners,
//! patients, rooms, providers, appointments and the medical record.
//!
//! # Architecture
//!
//! ```text
//!   Booking form ──► AppointmentService
//!                        │
//!          ┌─────────────┼──────────────────┐
//!          ▼             ▼                  ▼
//!    past-start     CombinationResolver   generate_reference
//!    validation     (room + provider ──►  "Max - Vaccination -
//!                    resource set,          2025-12-01 10:00")
//!                    atomic upsert)
//!                        │
//!                        ▼
//!                  SQLite (rusqlite)
//!                        ▲
//!                        │
//!                  OverlapDetector ──► provider / room conflicts + warning
//! ```
//!
//! # Core Principle
//!
//! **Overlap detection is advisory.** Double-bookings are reported, never blocked.
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer
//! - [`models`]: Domain types and pure weight/age conversions
//! - [`scheduling`]: Overlap detection, combination resolution, references
//! - [`config`]: Clinic settings

pub mod config;
pub mod db;
pub mod models;
pub mod scheduling;

// Re-export commonly used types
pub use config::{ClinicConfig, ConfigError};
pub use db::{BackfillReport, Database, DbError};
pub use models::{
    Appointment, AppointmentKind, AppointmentState, BookingType, Combination, MedicalNote,
    NoteType, Owner, Patient, Problem, ProblemStatus, Provider, ProviderType, Room, Species,
    WeightUnit,
};
pub use scheduling::{
    generate_reference, AppointmentService, CombinationResolver, OverlapCandidate,
    OverlapDetector, OverlapReport, OverlapStatus, SchedulingError,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum VetClinicError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Appointment date cannot be in the past: {0}")]
    StartInPast(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}

impl From<db::DbError> for VetClinicError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => VetClinicError::NotFound(what),
            other => VetClinicError::DatabaseError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for VetClinicError {
    fn from(e: serde_json::Error) -> Self {
        VetClinicError::SerializationError(e.to_string())
    }
}

impl From<scheduling::SchedulingError> for VetClinicError {
    fn from(e: scheduling::SchedulingError) -> Self {
        match e {
            SchedulingError::Database(e) => e.into(),
            SchedulingError::StartInPast { start, .. } => {
                VetClinicError::StartInPast(start.format(TIMESTAMP_FORMAT).to_string())
            }
            SchedulingError::InvalidDuration(hours) => {
                VetClinicError::InvalidInput(format!("duration {} hours", hours))
            }
            SchedulingError::NotFound(what) => VetClinicError::NotFound(what),
        }
    }
}

impl From<config::ConfigError> for VetClinicError {
    fn from(e: config::ConfigError) -> Self {
        VetClinicError::ConfigError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for VetClinicError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        VetClinicError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Boundary formats
// =========================================================================

/// Timestamps leave the library as "YYYY-MM-DD HH:MM:SS".
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, VetClinicError> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, models::MINUTE_FORMAT))
        .map_err(|_| {
            VetClinicError::InvalidInput(format!("Expected YYYY-MM-DD HH:MM[:SS], got {:?}", s))
        })
}

fn parse_date(s: &str) -> Result<NaiveDate, VetClinicError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| VetClinicError::InvalidInput(format!("Expected YYYY-MM-DD, got {:?}", s)))
}

fn today_or(today: Option<String>) -> Result<NaiveDate, VetClinicError> {
    match today {
        Some(s) => parse_date(&s),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<VetClinicCore>, VetClinicError> {
    let db = Database::open(&path)?;
    Ok(VetClinicCore::wrap(db, ClinicConfig::default()))
}

/// Open a database with settings from a JSON config file (defaults if missing).
#[uniffi::export]
pub fn open_database_with_config(
    path: String,
    config_path: String,
) -> Result<Arc<VetClinicCore>, VetClinicError> {
    let config = ClinicConfig::load(&config_path)?;
    let db = Database::open(&path)?;
    Ok(VetClinicCore::wrap(db, config))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<VetClinicCore>, VetClinicError> {
    let db = Database::open_in_memory()?;
    Ok(VetClinicCore::wrap(db, ClinicConfig::default()))
}

/// Convert kilograms to pounds.
#[uniffi::export]
pub fn convert_kg_to_lbs(kg: f64) -> f64 {
    models::kg_to_lbs(kg)
}

/// Convert pounds to kilograms.
#[uniffi::export]
pub fn convert_lbs_to_kg(lbs: f64) -> f64 {
    models::lbs_to_kg(lbs)
}

/// Age label ("2 year(s), 3 month(s)") for a birth date.
#[uniffi::export]
pub fn age_label(birth_date: String, today: Option<String>) -> Result<String, VetClinicError> {
    let birth_date = parse_date(&birth_date)?;
    let today = today_or(today)?;
    Ok(models::AgeSpan::between(birth_date, today).label())
}

/// Appointment reference from its parts.
#[uniffi::export]
pub fn appointment_reference(
    patient_name: Option<String>,
    type_label: Option<String>,
    start: Option<String>,
) -> Result<String, VetClinicError> {
    let start = start.as_deref().map(parse_timestamp).transpose()?;
    Ok(generate_reference(
        patient_name.as_deref(),
        type_label.as_deref(),
        start,
    ))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct VetClinicCore {
    db: Arc<Mutex<Database>>,
    config: ClinicConfig,
}

impl VetClinicCore {
    fn wrap(db: Database, config: ClinicConfig) -> Arc<Self> {
        Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
            config,
        })
    }

    fn load_patient(db: &Database, patient_id: &str) -> Result<Patient, VetClinicError> {
        db.get_patient(patient_id)?
            .ok_or_else(|| VetClinicError::NotFound(format!("patient {}", patient_id)))
    }

    fn load_problem(db: &Database, problem_id: &str) -> Result<Problem, VetClinicError> {
        db.get_problem(problem_id)?
            .ok_or_else(|| VetClinicError::NotFound(format!("problem {}", problem_id)))
    }
}

#[uniffi::export]
impl VetClinicCore {
    // =========================================================================
    // Owner Operations
    // =========================================================================

    /// Register a new owner.
    pub fn create_owner(&self, owner: FfiOwnerInput) -> Result<FfiOwner, VetClinicError> {
        let db = self.db.lock()?;
        let mut record = Owner::new(owner.name);
        record.email = owner.email;
        record.phone = owner.phone;
        record.mobile = owner.mobile;
        record.city = owner.city;
        db.insert_owner(&record)?;
        Ok(record.into())
    }

    /// Get an owner by ID.
    pub fn get_owner(&self, owner_id: String) -> Result<Option<FfiOwner>, VetClinicError> {
        let db = self.db.lock()?;
        Ok(db.get_owner(&owner_id)?.map(|o| o.into()))
    }

    /// List owners by name.
    pub fn list_owners(&self, active_only: bool) -> Result<Vec<FfiOwner>, VetClinicError> {
        let db = self.db.lock()?;
        let owners = db.list_owners(active_only)?;
        Ok(owners.into_iter().map(|o| o.into()).collect())
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Add a species (e.g. "Dog", code "DOG").
    pub fn create_species(
        &self,
        name: String,
        code: Option<String>,
    ) -> Result<FfiSpecies, VetClinicError> {
        if code.as_ref().is_some_and(|c| c.chars().count() > 10) {
            return Err(VetClinicError::InvalidInput(
                "Species code is at most 10 characters".into(),
            ));
        }
        let db = self.db.lock()?;
        let species = Species::new(name, code);
        db.insert_species(&species)?;
        Ok(species.into())
    }

    /// List species.
    pub fn list_species(&self) -> Result<Vec<FfiSpecies>, VetClinicError> {
        let db = self.db.lock()?;
        Ok(db.list_species()?.into_iter().map(|s| s.into()).collect())
    }

    /// Register a new patient.
    pub fn create_patient(
        &self,
        name: String,
        owner_id: String,
        species_id: String,
    ) -> Result<FfiPatient, VetClinicError> {
        let db = self.db.lock()?;
        let patient = Patient::new(name, owner_id, species_id);
        db.insert_patient(&patient)?;
        Ok(FfiPatient::from_patient(patient, chrono::Local::now().date_naive()))
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, patient_id: String) -> Result<Option<FfiPatient>, VetClinicError> {
        let db = self.db.lock()?;
        let today = chrono::Local::now().date_naive();
        Ok(db
            .get_patient(&patient_id)?
            .map(|p| FfiPatient::from_patient(p, today)))
    }

    /// Search patients by name prefix.
    pub fn search_patients(
        &self,
        query: String,
        limit: u32,
    ) -> Result<Vec<FfiPatient>, VetClinicError> {
        let db = self.db.lock()?;
        let today = chrono::Local::now().date_naive();
        let patients = db.search_patients(&query, limit as usize)?;
        Ok(patients
            .into_iter()
            .map(|p| FfiPatient::from_patient(p, today))
            .collect())
    }

    /// Typo-tolerant patient search, best match first.
    pub fn fuzzy_search_patients(&self, query: String) -> Result<Vec<FfiPatient>, VetClinicError> {
        let db = self.db.lock()?;
        let today = chrono::Local::now().date_naive();
        let patients = db.fuzzy_search_patients(
            &query,
            self.config.fuzzy_threshold,
            self.config.search_limit,
        )?;
        Ok(patients
            .into_iter()
            .map(|p| FfiPatient::from_patient(p, today))
            .collect())
    }

    /// Record a weight in the given unit ("kg" or "lbs"); also sets the display unit.
    pub fn set_patient_weight(
        &self,
        patient_id: String,
        value: f64,
        unit: String,
    ) -> Result<FfiPatient, VetClinicError> {
        let unit = WeightUnit::parse(&unit)
            .ok_or_else(|| VetClinicError::InvalidInput(format!("Unknown weight unit: {}", unit)))?;
        if !value.is_finite() || value < 0.0 {
            return Err(VetClinicError::InvalidInput(format!("Invalid weight: {}", value)));
        }

        let db = self.db.lock()?;
        let mut patient = Self::load_patient(&db, &patient_id)?;
        patient.weight_unit = unit;
        patient.set_display_weight(value);
        patient.touch();
        db.update_patient(&patient)?;
        Ok(FfiPatient::from_patient(patient, chrono::Local::now().date_naive()))
    }

    /// Set or clear the exact birth date.
    pub fn set_patient_birth_date(
        &self,
        patient_id: String,
        birth_date: Option<String>,
    ) -> Result<FfiPatient, VetClinicError> {
        let birth_date = birth_date.as_deref().map(parse_date).transpose()?;

        let db = self.db.lock()?;
        let mut patient = Self::load_patient(&db, &patient_id)?;
        patient.set_birth_date(birth_date);
        patient.touch();
        db.update_patient(&patient)?;
        Ok(FfiPatient::from_patient(patient, chrono::Local::now().date_naive()))
    }

    /// Set an approximate birth date from an age in years and months.
    pub fn set_patient_age(
        &self,
        patient_id: String,
        years: u32,
        months: u32,
        today: Option<String>,
    ) -> Result<FfiPatient, VetClinicError> {
        let today = today_or(today)?;

        let db = self.db.lock()?;
        let mut patient = Self::load_patient(&db, &patient_id)?;
        patient.set_age(years, months, today);
        patient.touch();
        db.update_patient(&patient)?;
        Ok(FfiPatient::from_patient(patient, today))
    }

    /// Appointment, note and problem counts.
    pub fn get_patient_summary(
        &self,
        patient_id: String,
    ) -> Result<FfiPatientSummary, VetClinicError> {
        let db = self.db.lock()?;
        Ok(db.patient_summary(&patient_id)?.into())
    }

    // =========================================================================
    // Room & Provider Operations
    // =========================================================================

    /// Add a room; its bookable resource is created with it.
    pub fn create_room(&self, name: String) -> Result<FfiRoom, VetClinicError> {
        let db = self.db.lock()?;
        let mut room = Room::new(name);
        db.insert_room(&mut room)?;
        Ok(room.into())
    }

    /// List rooms by sequence.
    pub fn list_rooms(&self, active_only: bool) -> Result<Vec<FfiRoom>, VetClinicError> {
        let db = self.db.lock()?;
        Ok(db.list_rooms(active_only)?.into_iter().map(|r| r.into()).collect())
    }

    /// Add a staff type. Members of provider types get a bookable resource.
    pub fn create_provider_type(
        &self,
        name: String,
        is_provider: bool,
    ) -> Result<String, VetClinicError> {
        let db = self.db.lock()?;
        let provider_type = ProviderType::new(name, is_provider);
        db.insert_provider_type(&provider_type)?;
        Ok(provider_type.id)
    }

    /// Add a staff member.
    pub fn create_provider(
        &self,
        name: String,
        provider_type_id: Option<String>,
    ) -> Result<FfiProvider, VetClinicError> {
        let db = self.db.lock()?;
        let mut provider = Provider::new(name, provider_type_id);
        db.insert_provider(&mut provider)?;
        Ok(provider.into())
    }

    /// Change a staff member's type, adding or removing their resource to match.
    pub fn set_provider_type(
        &self,
        provider_id: String,
        provider_type_id: Option<String>,
    ) -> Result<FfiProvider, VetClinicError> {
        let db = self.db.lock()?;
        let mut provider = db
            .get_provider(&provider_id)?
            .ok_or_else(|| VetClinicError::NotFound(format!("provider {}", provider_id)))?;
        provider.provider_type_id = provider_type_id;
        db.update_provider(&mut provider)?;
        Ok(provider.into())
    }

    /// List staff members; `providers_only` keeps bookable providers.
    pub fn list_providers(&self, providers_only: bool) -> Result<Vec<FfiProvider>, VetClinicError> {
        let db = self.db.lock()?;
        Ok(db
            .list_providers(providers_only)?
            .into_iter()
            .map(|p| p.into())
            .collect())
    }

    /// Create missing room/provider resources.
    pub fn ensure_linked_resources(&self) -> Result<FfiBackfillReport, VetClinicError> {
        let db = self.db.lock()?;
        Ok(db.ensure_linked_resources()?.into())
    }

    /// Add a booking type.
    pub fn create_booking_type(
        &self,
        name: String,
        duration_hours: Option<f64>,
    ) -> Result<FfiBookingType, VetClinicError> {
        let db = self.db.lock()?;
        let duration = duration_hours.unwrap_or(self.config.default_duration_hours);
        let booking_type = BookingType::new(name, duration);
        db.insert_booking_type(&booking_type)?;
        Ok(booking_type.into())
    }

    /// Find or create the combination for a room/provider pair.
    pub fn resolve_combination(
        &self,
        room_id: Option<String>,
        provider_id: Option<String>,
    ) -> Result<Option<FfiCombination>, VetClinicError> {
        let db = self.db.lock()?;
        let combination = CombinationResolver::new(&db)
            .resolve_for_ids(room_id.as_deref(), provider_id.as_deref())?;
        Ok(combination.map(|c| c.into()))
    }

    // =========================================================================
    // Appointment Operations
    // =========================================================================

    /// Book an appointment.
    pub fn create_appointment(
        &self,
        input: FfiAppointmentInput,
    ) -> Result<FfiAppointment, VetClinicError> {
        let start = parse_timestamp(&input.start)?;
        let kind = parse_kind(input.kind.as_deref())?;

        let db = self.db.lock()?;
        let service = AppointmentService::with_config(&db, self.config.clone());

        let booking_type = match &input.booking_type_id {
            Some(id) => Some(
                db.get_booking_type(id)?
                    .ok_or_else(|| VetClinicError::NotFound(format!("booking type {}", id)))?,
            ),
            None => None,
        };
        let mut appt = service.draft_appointment(input.patient_id, start, booking_type.as_ref());
        if let Some(hours) = input.duration_hours {
            appt.duration_hours = hours;
        }
        appt.kind = kind.unwrap_or_default();
        appt.provider_id = input.provider_id;
        appt.room_id = input.room_id;
        appt.reason = input.reason;
        appt.notes = input.notes;

        let saved = service.create_appointment(appt)?;
        Ok(saved.into())
    }

    /// Edit an appointment's booking details.
    pub fn update_appointment(
        &self,
        appointment_id: String,
        input: FfiAppointmentInput,
    ) -> Result<FfiAppointment, VetClinicError> {
        let start = parse_timestamp(&input.start)?;
        let kind = parse_kind(input.kind.as_deref())?;

        let db = self.db.lock()?;
        let mut appt = db
            .get_appointment(&appointment_id)?
            .ok_or_else(|| VetClinicError::NotFound(format!("appointment {}", appointment_id)))?;
        appt.patient_id = input.patient_id;
        appt.start = start;
        if let Some(hours) = input.duration_hours {
            appt.duration_hours = hours;
        }
        if let Some(kind) = kind {
            appt.kind = kind;
        }
        appt.booking_type_id = input.booking_type_id;
        appt.provider_id = input.provider_id;
        appt.room_id = input.room_id;
        appt.reason = input.reason;
        appt.notes = input.notes;

        let service = AppointmentService::with_config(&db, self.config.clone());
        Ok(service.update_appointment(appt)?.into())
    }

    /// Get an appointment by ID.
    pub fn get_appointment(
        &self,
        appointment_id: String,
    ) -> Result<Option<FfiAppointment>, VetClinicError> {
        let db = self.db.lock()?;
        Ok(db.get_appointment(&appointment_id)?.map(|a| a.into()))
    }

    /// A patient's appointments, most recent first.
    pub fn list_appointments_for_patient(
        &self,
        patient_id: String,
    ) -> Result<Vec<FfiAppointment>, VetClinicError> {
        let db = self.db.lock()?;
        let appointments = db.list_appointments_for_patient(&patient_id)?;
        Ok(appointments.into_iter().map(|a| a.into()).collect())
    }

    /// Display name: "{patient} - {owner}", falling back to the reference.
    pub fn appointment_display_name(&self, appointment_id: String) -> Result<String, VetClinicError> {
        let db = self.db.lock()?;
        let appt = db
            .get_appointment(&appointment_id)?
            .ok_or_else(|| VetClinicError::NotFound(format!("appointment {}", appointment_id)))?;
        let patient = db.get_patient(&appt.patient_id)?;
        let owner = match &patient {
            Some(p) => db.get_owner(&p.owner_id)?,
            None => None,
        };
        Ok(appt.display_name(
            patient.as_ref().map(|p| p.name.as_str()),
            owner.as_ref().map(|o| o.name.as_str()),
        ))
    }

    pub fn confirm_appointment(&self, appointment_id: String) -> Result<(), VetClinicError> {
        let db = self.db.lock()?;
        AppointmentService::new(&db).confirm(&appointment_id)?;
        Ok(())
    }

    pub fn start_appointment(&self, appointment_id: String) -> Result<(), VetClinicError> {
        let db = self.db.lock()?;
        AppointmentService::new(&db).start(&appointment_id)?;
        Ok(())
    }

    pub fn complete_appointment(&self, appointment_id: String) -> Result<(), VetClinicError> {
        let db = self.db.lock()?;
        AppointmentService::new(&db).complete(&appointment_id)?;
        Ok(())
    }

    pub fn cancel_appointment(&self, appointment_id: String) -> Result<(), VetClinicError> {
        let db = self.db.lock()?;
        AppointmentService::new(&db).cancel(&appointment_id)?;
        Ok(())
    }

    /// Conflicts for a booking that may not be saved yet.
    pub fn check_overlaps(
        &self,
        candidate: FfiOverlapCandidate,
    ) -> Result<FfiOverlapStatus, VetClinicError> {
        let candidate = OverlapCandidate::try_from(candidate)?;
        let db = self.db.lock()?;
        let status = AppointmentService::new(&db).check_candidate(&candidate)?;
        Ok(status.into())
    }

    /// Conflicts for a stored appointment.
    pub fn appointment_overlaps(
        &self,
        appointment_id: String,
    ) -> Result<FfiOverlapStatus, VetClinicError> {
        let db = self.db.lock()?;
        let status = AppointmentService::new(&db).overlap_report(&appointment_id)?;
        Ok(status.into())
    }

    /// Overlap report for a stored appointment as JSON.
    pub fn appointment_overlaps_json(&self, appointment_id: String) -> Result<String, VetClinicError> {
        let db = self.db.lock()?;
        let status = AppointmentService::new(&db).overlap_report(&appointment_id)?;
        Ok(status.report.to_json()?)
    }

    // =========================================================================
    // Medical Record Operations
    // =========================================================================

    /// Add a problem to a patient's problem list.
    pub fn add_problem(
        &self,
        patient_id: String,
        name: String,
        onset_date: Option<String>,
    ) -> Result<FfiProblem, VetClinicError> {
        let onset = today_or(onset_date)?;
        let db = self.db.lock()?;
        let problem = Problem::new(name, patient_id, onset);
        db.insert_problem(&problem)?;
        Ok(problem.into())
    }

    /// Mark a problem resolved as of `today` (defaults to the current date).
    pub fn resolve_problem(
        &self,
        problem_id: String,
        today: Option<String>,
    ) -> Result<FfiProblem, VetClinicError> {
        let today = today_or(today)?;
        let db = self.db.lock()?;
        let mut problem = Self::load_problem(&db, &problem_id)?;
        problem.mark_resolved(today);
        db.update_problem(&problem)?;
        Ok(problem.into())
    }

    /// Reopen a resolved problem.
    pub fn reopen_problem(&self, problem_id: String) -> Result<FfiProblem, VetClinicError> {
        let db = self.db.lock()?;
        let mut problem = Self::load_problem(&db, &problem_id)?;
        problem.mark_active();
        db.update_problem(&problem)?;
        Ok(problem.into())
    }

    /// A patient's problem list, active first.
    pub fn list_problems(&self, patient_id: String) -> Result<Vec<FfiProblem>, VetClinicError> {
        let db = self.db.lock()?;
        let problems = db.list_problems_for_patient(&patient_id)?;
        Ok(problems.into_iter().map(|p| p.into()).collect())
    }

    /// Write a medical note.
    pub fn add_medical_note(
        &self,
        input: FfiMedicalNoteInput,
    ) -> Result<FfiMedicalNote, VetClinicError> {
        let date = match input.date.as_deref() {
            Some(s) => parse_timestamp(s)?,
            None => chrono::Local::now().naive_local(),
        };
        let note_type = NoteType::parse(&input.note_type).ok_or_else(|| {
            VetClinicError::InvalidInput(format!("Unknown note type: {}", input.note_type))
        })?;

        let db = self.db.lock()?;
        let patient = Self::load_patient(&db, &input.patient_id)?;
        let mut note = MedicalNote::new(patient.id.clone(), input.author_id, note_type, date);
        note.appointment_id = input.appointment_id;
        note.subjective = input.subjective;
        note.objective = input.objective;
        note.assessment = input.assessment;
        note.plan = input.plan;
        note.content = input.content;
        note.is_private = input.is_private;
        note.is_important = input.is_important;
        db.insert_medical_note(&note)?;
        Ok(FfiMedicalNote::from_note(note, &patient.name))
    }

    /// A patient's notes, newest first.
    pub fn list_medical_notes(
        &self,
        patient_id: String,
    ) -> Result<Vec<FfiMedicalNote>, VetClinicError> {
        let db = self.db.lock()?;
        let patient = Self::load_patient(&db, &patient_id)?;
        let notes = db.list_notes_for_patient(&patient_id)?;
        Ok(notes
            .into_iter()
            .map(|n| FfiMedicalNote::from_note(n, &patient.name))
            .collect())
    }

    /// Attach a note to a problem.
    pub fn link_problem_note(
        &self,
        problem_id: String,
        note_id: String,
    ) -> Result<bool, VetClinicError> {
        let db = self.db.lock()?;
        Ok(db.link_problem_note(&problem_id, &note_id)?)
    }
}

fn parse_kind(kind: Option<&str>) -> Result<Option<AppointmentKind>, VetClinicError> {
    kind.map(|k| {
        AppointmentKind::parse(k)
            .ok_or_else(|| VetClinicError::InvalidInput(format!("Unknown appointment kind: {}", k)))
    })
    .transpose()
}

// =========================================================================
// FFI-safe Types
// =========================================================================

/// FFI-safe owner.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOwner {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub city: Option<String>,
    pub contact_number: Option<String>,
    pub active: bool,
}

impl From<Owner> for FfiOwner {
    fn from(owner: Owner) -> Self {
        let contact_number = owner.contact_number().map(str::to_string);
        Self {
            id: owner.id,
            name: owner.name,
            email: owner.email,
            phone: owner.phone,
            mobile: owner.mobile,
            city: owner.city,
            contact_number,
            active: owner.active,
        }
    }
}

/// FFI-safe owner registration.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOwnerInput {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub city: Option<String>,
}

/// FFI-safe species.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSpecies {
    pub id: String,
    pub name: String,
    pub code: Option<String>,
}

impl From<Species> for FfiSpecies {
    fn from(species: Species) -> Self {
        Self {
            id: species.id,
            name: species.name,
            code: species.code,
        }
    }
}

/// FFI-safe patient with derived display values.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub species_id: String,
    pub breed: Option<String>,
    pub gender: String,
    pub birth_date: Option<String>,
    pub birth_date_approximate: bool,
    pub age_label: String,
    pub weight_kg: Option<f64>,
    pub weight_unit: String,
    /// Weight in `weight_unit`; 0 when unknown
    pub display_weight: f64,
    pub allergies: Option<String>,
    pub active: bool,
}

impl FfiPatient {
    fn from_patient(patient: Patient, today: NaiveDate) -> Self {
        let age_label = patient.age_label(today);
        let display_weight = patient.display_weight();
        Self {
            id: patient.id,
            name: patient.name,
            owner_id: patient.owner_id,
            species_id: patient.species_id,
            breed: patient.breed,
            gender: patient.gender.as_str().to_string(),
            birth_date: patient.birth_date.map(|d| d.format("%Y-%m-%d").to_string()),
            birth_date_approximate: patient.birth_date_approximate,
            age_label,
            weight_kg: patient.weight_kg,
            weight_unit: patient.weight_unit.as_str().to_string(),
            display_weight,
            allergies: patient.allergies,
            active: patient.active,
        }
    }
}

/// FFI-safe patient record counts.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientSummary {
    pub appointment_count: u32,
    pub medical_note_count: u32,
    pub problem_count: u32,
    pub active_problem_count: u32,
}

impl From<models::PatientSummary> for FfiPatientSummary {
    fn from(summary: models::PatientSummary) -> Self {
        Self {
            appointment_count: summary.appointment_count,
            medical_note_count: summary.medical_note_count,
            problem_count: summary.problem_count,
            active_problem_count: summary.active_problem_count,
        }
    }
}

/// FFI-safe room.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRoom {
    pub id: String,
    pub name: String,
    pub sequence: i64,
    pub active: bool,
    pub resource_id: Option<String>,
}

impl From<Room> for FfiRoom {
    fn from(room: Room) -> Self {
        Self {
            id: room.id,
            name: room.name,
            sequence: room.sequence,
            active: room.active,
            resource_id: room.resource_id,
        }
    }
}

/// FFI-safe staff member.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiProvider {
    pub id: String,
    pub name: String,
    pub provider_type_id: Option<String>,
    pub resource_id: Option<String>,
    pub active: bool,
}

impl From<Provider> for FfiProvider {
    fn from(provider: Provider) -> Self {
        Self {
            id: provider.id,
            name: provider.name,
            provider_type_id: provider.provider_type_id,
            resource_id: provider.resource_id,
            active: provider.active,
        }
    }
}

/// FFI-safe backfill counts.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBackfillReport {
    pub rooms: u32,
    pub providers: u32,
}

impl From<BackfillReport> for FfiBackfillReport {
    fn from(report: BackfillReport) -> Self {
        Self {
            rooms: report.rooms,
            providers: report.providers,
        }
    }
}

/// FFI-safe booking type.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBookingType {
    pub id: String,
    pub name: String,
    pub duration_hours: f64,
}

impl From<BookingType> for FfiBookingType {
    fn from(booking_type: BookingType) -> Self {
        Self {
            id: booking_type.id,
            name: booking_type.name,
            duration_hours: booking_type.duration_hours,
        }
    }
}

/// FFI-safe resource combination.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCombination {
    pub id: String,
    pub name: String,
    pub resource_ids: Vec<String>,
}

impl From<Combination> for FfiCombination {
    fn from(combination: Combination) -> Self {
        Self {
            id: combination.id,
            name: combination.name,
            resource_ids: combination.resource_ids,
        }
    }
}

/// FFI-safe appointment booking details.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointmentInput {
    pub patient_id: String,
    /// "YYYY-MM-DD HH:MM[:SS]"
    pub start: String,
    /// Defaults to the booking type's duration, then the clinic default
    pub duration_hours: Option<f64>,
    /// checkup, vaccination, surgery, emergency, followup, other
    pub kind: Option<String>,
    pub booking_type_id: Option<String>,
    pub provider_id: Option<String>,
    pub room_id: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

/// FFI-safe appointment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointment {
    pub id: String,
    pub name: String,
    pub patient_id: String,
    pub kind: String,
    pub booking_type_id: Option<String>,
    pub start: String,
    pub end: String,
    pub duration_hours: f64,
    pub provider_id: Option<String>,
    pub room_id: Option<String>,
    pub combination_id: Option<String>,
    pub state: String,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

impl From<Appointment> for FfiAppointment {
    fn from(appt: Appointment) -> Self {
        let end = format_timestamp(&appt.end());
        Self {
            id: appt.id,
            name: appt.name,
            patient_id: appt.patient_id,
            kind: appt.kind.as_str().to_string(),
            booking_type_id: appt.booking_type_id,
            start: format_timestamp(&appt.start),
            end,
            duration_hours: appt.duration_hours,
            provider_id: appt.provider_id,
            room_id: appt.room_id,
            combination_id: appt.combination_id,
            state: appt.state.as_str().to_string(),
            reason: appt.reason,
            notes: appt.notes,
        }
    }
}

/// FFI-safe overlap check input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOverlapCandidate {
    pub appointment_id: Option<String>,
    pub start: Option<String>,
    pub duration_hours: Option<f64>,
    pub provider_id: Option<String>,
    pub room_id: Option<String>,
}

impl TryFrom<FfiOverlapCandidate> for OverlapCandidate {
    type Error = VetClinicError;

    fn try_from(candidate: FfiOverlapCandidate) -> Result<Self, Self::Error> {
        Ok(OverlapCandidate {
            id: candidate.appointment_id,
            start: candidate.start.as_deref().map(parse_timestamp).transpose()?,
            duration_hours: candidate.duration_hours,
            provider_id: candidate.provider_id,
            room_id: candidate.room_id,
        })
    }
}

/// FFI-safe overlap result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOverlapStatus {
    pub has_overlap: bool,
    pub provider_conflicts: Vec<FfiAppointment>,
    pub room_conflicts: Vec<FfiAppointment>,
    /// HTML warning block; absent without conflicts
    pub warning: Option<String>,
}

impl From<OverlapStatus> for FfiOverlapStatus {
    fn from(status: OverlapStatus) -> Self {
        Self {
            has_overlap: status.has_overlap(),
            provider_conflicts: status
                .report
                .provider_conflicts
                .into_iter()
                .map(|a| a.into())
                .collect(),
            room_conflicts: status
                .report
                .room_conflicts
                .into_iter()
                .map(|a| a.into())
                .collect(),
            warning: status.warning,
        }
    }
}

/// FFI-safe problem list entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiProblem {
    pub id: String,
    pub name: String,
    pub patient_id: String,
    pub status: String,
    pub onset_date: String,
    pub resolved_date: Option<String>,
    pub diagnosis_code: Option<String>,
}

impl From<Problem> for FfiProblem {
    fn from(problem: Problem) -> Self {
        Self {
            id: problem.id,
            name: problem.name,
            patient_id: problem.patient_id,
            status: problem.status.as_str().to_string(),
            onset_date: problem.onset_date.format("%Y-%m-%d").to_string(),
            resolved_date: problem
                .resolved_date
                .map(|d| d.format("%Y-%m-%d").to_string()),
            diagnosis_code: problem.diagnosis_code,
        }
    }
}

/// FFI-safe medical note input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicalNoteInput {
    pub patient_id: String,
    pub author_id: String,
    /// soap, communication, internal, result, image, report
    pub note_type: String,
    /// Defaults to now
    pub date: Option<String>,
    pub appointment_id: Option<String>,
    pub subjective: Option<String>,
    pub objective: Option<String>,
    pub assessment: Option<String>,
    pub plan: Option<String>,
    pub content: Option<String>,
    pub is_private: bool,
    pub is_important: bool,
}

/// FFI-safe medical note.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicalNote {
    pub id: String,
    pub title: String,
    pub patient_id: String,
    pub appointment_id: Option<String>,
    pub date: String,
    pub author_id: String,
    pub note_type: String,
    pub subjective: Option<String>,
    pub objective: Option<String>,
    pub assessment: Option<String>,
    pub plan: Option<String>,
    pub content: Option<String>,
    pub is_private: bool,
    pub is_important: bool,
}

impl FfiMedicalNote {
    fn from_note(note: MedicalNote, patient_name: &str) -> Self {
        let title = note.title(patient_name);
        Self {
            id: note.id,
            title,
            patient_id: note.patient_id,
            appointment_id: note.appointment_id,
            date: format_timestamp(&note.date),
            author_id: note.author_id,
            note_type: note.note_type.as_str().to_string(),
            subjective: note.subjective,
            objective: note.objective,
            assessment: note.assessment,
            plan: note.plan,
            content: note.content,
            is_private: note.is_private,
            is_important: note.is_important,
        }
    }
}
