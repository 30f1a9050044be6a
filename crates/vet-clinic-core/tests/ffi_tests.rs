//! Tests for the FFI facade.

use vet_clinic_core::{
    age_label, appointment_reference, convert_kg_to_lbs, open_database, open_database_in_memory,
    open_database_with_config, FfiAppointmentInput, FfiMedicalNoteInput, FfiOverlapCandidate,
    FfiOwnerInput, VetClinicCore, VetClinicError,
};

use std::sync::Arc;

struct Setup {
    core: Arc<VetClinicCore>,
    patient_id: String,
    vet_id: String,
    room_id: String,
}

fn setup() -> Setup {
    let core = open_database_in_memory().unwrap();
    let owner = core
        .create_owner(FfiOwnerInput {
            name: "John Doe".into(),
            email: Some("john@example.com".into()),
            phone: Some("555-0100".into()),
            mobile: None,
            city: None,
        })
        .unwrap();
    let species = core.create_species("Dog".into(), Some("DOG".into())).unwrap();
    let patient = core
        .create_patient("Max".into(), owner.id.clone(), species.id)
        .unwrap();

    let doctor_type = core.create_provider_type("Doctor".into(), true).unwrap();
    let vet = core
        .create_provider("Dr. Smith".into(), Some(doctor_type))
        .unwrap();
    let room = core.create_room("Room 1".into()).unwrap();

    Setup {
        core,
        patient_id: patient.id,
        vet_id: vet.id,
        room_id: room.id,
    }
}

fn booking(s: &Setup, start: &str) -> FfiAppointmentInput {
    FfiAppointmentInput {
        patient_id: s.patient_id.clone(),
        start: start.into(),
        duration_hours: Some(1.0),
        kind: Some("vaccination".into()),
        booking_type_id: None,
        provider_id: Some(s.vet_id.clone()),
        room_id: Some(s.room_id.clone()),
        reason: None,
        notes: None,
    }
}

#[test]
fn test_book_and_detect_overlap() {
    let s = setup();

    let first = s.core.create_appointment(booking(&s, "2099-12-01 10:00")).unwrap();
    assert_eq!(first.name, "Max - Vaccination - 2099-12-01 10:00");
    assert_eq!(first.end, "2099-12-01 11:00:00");
    assert!(first.combination_id.is_some());

    let status = s
        .core
        .check_overlaps(FfiOverlapCandidate {
            appointment_id: None,
            start: Some("2099-12-01 10:30".into()),
            duration_hours: Some(1.0),
            provider_id: Some(s.vet_id.clone()),
            room_id: None,
        })
        .unwrap();
    assert!(status.has_overlap);
    assert_eq!(status.provider_conflicts.len(), 1);
    assert!(status.room_conflicts.is_empty());
    assert!(status.warning.unwrap().contains("Provider Overlap"));

    let json = s.core.appointment_overlaps_json(first.id.clone()).unwrap();
    assert!(json.contains("provider_conflicts"));
}

#[test]
fn test_past_booking_rejected() {
    let s = setup();
    let result = s.core.create_appointment(booking(&s, "2000-01-01 10:00"));
    assert!(matches!(result, Err(VetClinicError::StartInPast(_))));
}

#[test]
fn test_runaway_duration_rejected_and_core_still_usable() {
    let s = setup();
    let mut input = booking(&s, "2099-12-01 08:00");
    input.duration_hours = Some(1.0e13);
    assert!(matches!(
        s.core.create_appointment(input),
        Err(VetClinicError::InvalidInput(_))
    ));

    let appt = s.core.create_appointment(booking(&s, "2099-12-01 09:00")).unwrap();
    let status = s.core.appointment_overlaps(appt.id).unwrap();
    assert!(!status.has_overlap);
}

#[test]
fn test_bad_timestamp_rejected() {
    let s = setup();
    let result = s.core.create_appointment(booking(&s, "tomorrow at ten"));
    assert!(matches!(result, Err(VetClinicError::InvalidInput(_))));
}

#[test]
fn test_state_transitions() {
    let s = setup();
    let appt = s.core.create_appointment(booking(&s, "2099-12-01 10:00")).unwrap();

    s.core.confirm_appointment(appt.id.clone()).unwrap();
    assert_eq!(
        s.core.get_appointment(appt.id.clone()).unwrap().unwrap().state,
        "confirmed"
    );
    s.core.cancel_appointment(appt.id.clone()).unwrap();
    assert_eq!(
        s.core.get_appointment(appt.id.clone()).unwrap().unwrap().state,
        "cancelled"
    );

    assert!(matches!(
        s.core.start_appointment("missing".into()),
        Err(VetClinicError::NotFound(_))
    ));
}

#[test]
fn test_display_name_uses_owner() {
    let s = setup();
    let appt = s.core.create_appointment(booking(&s, "2099-12-01 10:00")).unwrap();
    assert_eq!(s.core.appointment_display_name(appt.id).unwrap(), "Max - John Doe");
}

#[test]
fn test_weight_and_age() {
    let s = setup();

    let patient = s
        .core
        .set_patient_weight(s.patient_id.clone(), 66.0, "lbs".into())
        .unwrap();
    assert_eq!(patient.weight_unit, "lbs");
    assert!((patient.weight_kg.unwrap() - 29.937).abs() < 0.01);
    assert!((patient.display_weight - 66.0).abs() < 0.01);

    let patient = s
        .core
        .set_patient_age(s.patient_id.clone(), 2, 3, Some("2025-12-01".into()))
        .unwrap();
    assert_eq!(patient.birth_date.as_deref(), Some("2023-09-01"));
    assert!(patient.birth_date_approximate);

    let patient = s
        .core
        .set_patient_birth_date(s.patient_id.clone(), Some("2020-05-17".into()))
        .unwrap();
    assert!(!patient.birth_date_approximate);

    assert!(matches!(
        s.core.set_patient_weight(s.patient_id.clone(), 10.0, "stone".into()),
        Err(VetClinicError::InvalidInput(_))
    ));
}

#[test]
fn test_problem_and_note_workflow() {
    let s = setup();

    let problem = s
        .core
        .add_problem(s.patient_id.clone(), "Otitis externa".into(), Some("2025-03-01".into()))
        .unwrap();
    let note = s
        .core
        .add_medical_note(FfiMedicalNoteInput {
            patient_id: s.patient_id.clone(),
            author_id: s.vet_id.clone(),
            note_type: "soap".into(),
            date: Some("2025-03-01 14:30".into()),
            appointment_id: None,
            subjective: Some("Head shaking".into()),
            objective: None,
            assessment: Some("Otitis externa".into()),
            plan: Some("Ear drops BID".into()),
            content: None,
            is_private: false,
            is_important: true,
        })
        .unwrap();
    assert_eq!(note.title, "SOAP Note - Max - 2025-03-01 14:30");
    assert!(s.core.link_problem_note(problem.id.clone(), note.id).unwrap());

    let resolved = s
        .core
        .resolve_problem(problem.id.clone(), Some("2025-04-01".into()))
        .unwrap();
    assert_eq!(resolved.status, "resolved");
    assert_eq!(resolved.resolved_date.as_deref(), Some("2025-04-01"));

    let reopened = s.core.reopen_problem(problem.id).unwrap();
    assert!(reopened.resolved_date.is_none());

    let summary = s.core.get_patient_summary(s.patient_id.clone()).unwrap();
    assert_eq!(summary.problem_count, 1);
    assert_eq!(summary.active_problem_count, 1);
    assert_eq!(summary.medical_note_count, 1);
}

#[test]
fn test_combination_and_backfill() {
    let s = setup();
    let first = s
        .core
        .resolve_combination(Some(s.room_id.clone()), Some(s.vet_id.clone()))
        .unwrap()
        .unwrap();
    let again = s
        .core
        .resolve_combination(Some(s.room_id.clone()), Some(s.vet_id.clone()))
        .unwrap()
        .unwrap();
    assert_eq!(first.id, again.id);
    assert_eq!(first.name, "Room 1 + Dr. Smith");

    assert!(s.core.resolve_combination(None, None).unwrap().is_none());

    let report = s.core.ensure_linked_resources().unwrap();
    assert_eq!((report.rooms, report.providers), (0, 0));
}

#[test]
fn test_fuzzy_search() {
    let s = setup();
    let results = s.core.fuzzy_search_patients("Maxx".into()).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "Max");
}

#[test]
fn test_free_functions() {
    assert!((convert_kg_to_lbs(10.0) - 22.0462).abs() < 1e-9);
    assert_eq!(
        age_label("2023-09-01".into(), Some("2025-12-01".into())).unwrap(),
        "2 year(s), 3 month(s)"
    );
    assert_eq!(
        appointment_reference(Some("Max".into()), None, Some("2025-12-01 10:00".into())).unwrap(),
        "Max - 2025-12-01 10:00"
    );
    assert_eq!(appointment_reference(None, None, None).unwrap(), "Appointment");
}

#[test]
fn test_file_backed_database_with_config() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("clinic.db");
    let config_path = dir.path().join("clinic.json");
    std::fs::write(&config_path, r#"{"default_duration_hours": 0.75}"#).unwrap();

    {
        let core = open_database_with_config(
            db_path.to_string_lossy().into_owned(),
            config_path.to_string_lossy().into_owned(),
        )
        .unwrap();
        let booking_type = core.create_booking_type("Consult".into(), None).unwrap();
        assert_eq!(booking_type.duration_hours, 0.75);
        core.create_room("Exam 1".into()).unwrap();
    }

    let core = open_database(db_path.to_string_lossy().into_owned()).unwrap();
    assert_eq!(core.list_rooms(true).unwrap().len(), 1);
}
