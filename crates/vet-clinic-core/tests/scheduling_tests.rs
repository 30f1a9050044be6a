//! Scheduling integration tests: overlap detection, combinations and the
//! appointment workflow against a real database.

use chrono::NaiveDateTime;
use vet_clinic_core::db::Database;
use vet_clinic_core::models::{
    Appointment, AppointmentState, BookingType, Owner, Patient, Provider, ProviderType, Room,
    Species,
};
use vet_clinic_core::scheduling::{
    AppointmentService, CombinationResolver, OverlapCandidate, OverlapDetector,
};

fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

struct Clinic {
    db: Database,
    max: Patient,
    luna: Patient,
    room1: Room,
    room2: Room,
    smith: Provider,
    jones: Provider,
}

fn setup_clinic() -> Clinic {
    let db = Database::open_in_memory().unwrap();

    let owner = Owner::new("John Doe".into());
    db.insert_owner(&owner).unwrap();
    let dog = Species::new("Dog".into(), Some("DOG".into()));
    db.insert_species(&dog).unwrap();
    let max = Patient::new("Max".into(), owner.id.clone(), dog.id.clone());
    let luna = Patient::new("Luna".into(), owner.id.clone(), dog.id.clone());
    db.insert_patient(&max).unwrap();
    db.insert_patient(&luna).unwrap();

    let mut room1 = Room::new("Room 1".into());
    let mut room2 = Room::new("Room 2".into());
    db.insert_room(&mut room1).unwrap();
    db.insert_room(&mut room2).unwrap();

    let doctor = ProviderType::new("Doctor".into(), true);
    db.insert_provider_type(&doctor).unwrap();
    let mut smith = Provider::new("Dr. Smith".into(), Some(doctor.id.clone()));
    let mut jones = Provider::new("Dr. Jones".into(), Some(doctor.id.clone()));
    db.insert_provider(&mut smith).unwrap();
    db.insert_provider(&mut jones).unwrap();

    Clinic {
        db,
        max,
        luna,
        room1,
        room2,
        smith,
        jones,
    }
}

fn service(db: &Database) -> AppointmentService<'_> {
    AppointmentService::new(db).at(at("2025-11-01 08:00"))
}

fn book(
    clinic: &Clinic,
    patient: &Patient,
    start: &str,
    hours: f64,
    provider: Option<&Provider>,
    room: Option<&Room>,
) -> Appointment {
    let mut appt = Appointment::new(patient.id.clone(), at(start), hours);
    appt.provider_id = provider.map(|p| p.id.clone());
    appt.room_id = room.map(|r| r.id.clone());
    service(&clinic.db).create_appointment(appt).unwrap()
}

fn conflicts_of(db: &Database, appt: &Appointment) -> (Vec<String>, Vec<String>) {
    let report = OverlapDetector::new(db)
        .detect_overlaps(&OverlapCandidate::from(appt))
        .unwrap();
    (
        report.provider_conflicts.into_iter().map(|a| a.id).collect(),
        report.room_conflicts.into_iter().map(|a| a.id).collect(),
    )
}

// ============================================================================
// Overlap detection
// ============================================================================

#[test]
fn test_same_provider_overlap_is_provider_conflict_only() {
    let c = setup_clinic();
    let a = book(&c, &c.max, "2025-12-01 10:00", 1.0, Some(&c.smith), Some(&c.room1));
    let b = book(&c, &c.luna, "2025-12-01 10:30", 1.0, Some(&c.smith), Some(&c.room2));

    let (provider, room) = conflicts_of(&c.db, &b);
    assert_eq!(provider, vec![a.id.clone()]);
    assert!(room.is_empty());

    // Symmetric
    let (provider, room) = conflicts_of(&c.db, &a);
    assert_eq!(provider, vec![b.id.clone()]);
    assert!(room.is_empty());
}

#[test]
fn test_touching_windows_do_not_conflict() {
    let c = setup_clinic();
    let a = book(&c, &c.max, "2025-12-01 10:00", 1.0, Some(&c.smith), Some(&c.room1));
    let b = book(&c, &c.luna, "2025-12-01 11:00", 1.0, Some(&c.smith), Some(&c.room1));

    assert_eq!(conflicts_of(&c.db, &a), (vec![], vec![]));
    assert_eq!(conflicts_of(&c.db, &b), (vec![], vec![]));
}

#[test]
fn test_disjoint_windows_never_conflict() {
    let c = setup_clinic();
    let a = book(&c, &c.max, "2025-12-01 08:00", 0.5, Some(&c.smith), Some(&c.room1));
    let b = book(&c, &c.luna, "2025-12-01 14:00", 2.0, Some(&c.smith), Some(&c.room1));

    assert_eq!(conflicts_of(&c.db, &a), (vec![], vec![]));
    assert_eq!(conflicts_of(&c.db, &b), (vec![], vec![]));
}

#[test]
fn test_shared_provider_and_room_listed_in_both() {
    let c = setup_clinic();
    let a = book(&c, &c.max, "2025-12-01 10:00", 1.0, Some(&c.smith), Some(&c.room1));
    let b = book(&c, &c.luna, "2025-12-01 10:15", 0.5, Some(&c.smith), Some(&c.room1));

    let (provider, room) = conflicts_of(&c.db, &b);
    assert_eq!(provider, vec![a.id.clone()]);
    assert_eq!(room, vec![a.id.clone()]);
}

#[test]
fn test_room_conflict_with_different_providers() {
    let c = setup_clinic();
    let a = book(&c, &c.max, "2025-12-01 10:00", 1.0, Some(&c.smith), Some(&c.room1));
    let b = book(&c, &c.luna, "2025-12-01 10:30", 1.0, Some(&c.jones), Some(&c.room1));

    let (provider, room) = conflicts_of(&c.db, &b);
    assert!(provider.is_empty());
    assert_eq!(room, vec![a.id.clone()]);
}

#[test]
fn test_done_and_cancelled_are_ignored() {
    let c = setup_clinic();
    let svc = service(&c.db);
    let done = book(&c, &c.max, "2025-12-01 10:00", 1.0, Some(&c.smith), None);
    let cancelled = book(&c, &c.luna, "2025-12-01 10:15", 1.0, Some(&c.smith), None);
    svc.complete(&done.id).unwrap();
    svc.cancel(&cancelled.id).unwrap();

    let candidate = OverlapCandidate {
        start: Some(at("2025-12-01 10:30")),
        duration_hours: Some(1.0),
        provider_id: Some(c.smith.id.clone()),
        ..Default::default()
    };
    let status = svc.check_candidate(&candidate).unwrap();
    assert!(!status.has_overlap());
    assert!(status.warning.is_none());
}

#[test]
fn test_conflicts_ordered_by_start_descending() {
    let c = setup_clinic();
    let early = book(&c, &c.max, "2025-12-01 09:00", 2.0, Some(&c.smith), None);
    let late = book(&c, &c.luna, "2025-12-01 10:00", 2.0, Some(&c.smith), None);

    let candidate = OverlapCandidate {
        start: Some(at("2025-12-01 10:30")),
        duration_hours: Some(0.5),
        provider_id: Some(c.smith.id.clone()),
        ..Default::default()
    };
    let report = OverlapDetector::new(&c.db).detect_overlaps(&candidate).unwrap();
    let ids: Vec<String> = report.provider_conflicts.into_iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![late.id, early.id]);
}

#[test]
fn test_incomplete_candidates_have_no_conflicts() {
    let c = setup_clinic();
    book(&c, &c.max, "2025-12-01 10:00", 1.0, Some(&c.smith), Some(&c.room1));
    let detector = OverlapDetector::new(&c.db);

    let no_resources = OverlapCandidate {
        start: Some(at("2025-12-01 10:00")),
        duration_hours: Some(1.0),
        ..Default::default()
    };
    assert!(!detector.detect_overlaps(&no_resources).unwrap().has_overlap());

    let no_start = OverlapCandidate {
        duration_hours: Some(1.0),
        provider_id: Some(c.smith.id.clone()),
        ..Default::default()
    };
    assert!(!detector.detect_overlaps(&no_start).unwrap().has_overlap());

    let zero_duration = OverlapCandidate {
        start: Some(at("2025-12-01 10:00")),
        duration_hours: Some(0.0),
        provider_id: Some(c.smith.id.clone()),
        ..Default::default()
    };
    assert!(!detector.detect_overlaps(&zero_duration).unwrap().has_overlap());
}

#[test]
fn test_warning_lists_provider_then_room() {
    let c = setup_clinic();
    book(&c, &c.max, "2025-12-01 10:00", 1.0, Some(&c.smith), Some(&c.room2));
    book(&c, &c.luna, "2025-12-01 10:00", 1.0, Some(&c.jones), Some(&c.room1));

    let candidate = OverlapCandidate {
        start: Some(at("2025-12-01 10:30")),
        duration_hours: Some(1.0),
        provider_id: Some(c.smith.id.clone()),
        room_id: Some(c.room1.id.clone()),
        ..Default::default()
    };
    let warning = service(&c.db).check_candidate(&candidate).unwrap().warning.unwrap();

    assert_eq!(
        warning,
        "<div class=\"alert alert-warning\">\
         <strong>Provider Overlap:</strong><br/>\
         \u{20}\u{20}• Max - Regular Checkup - 2025-12-01 10:00 - 2025-12-01 10:00 (Max)<br/>\
         <strong>Room Overlap:</strong><br/>\
         \u{20}\u{20}• Luna - Regular Checkup - 2025-12-01 10:00 - 2025-12-01 10:00 (Luna)\
         </div>"
    );
}

// ============================================================================
// Combinations
// ============================================================================

#[test]
fn test_resolving_same_pair_twice_returns_same_combination() {
    let c = setup_clinic();
    let resolver = CombinationResolver::new(&c.db);

    let first = resolver
        .resolve_combination(Some(&c.room1), Some(&c.smith))
        .unwrap()
        .unwrap();
    let second = resolver
        .resolve_combination(Some(&c.room1), Some(&c.smith))
        .unwrap()
        .unwrap();
    assert_eq!(first.id, second.id);

    let other = resolver
        .resolve_combination(Some(&c.room2), Some(&c.smith))
        .unwrap()
        .unwrap();
    assert_ne!(first.id, other.id);
    assert_eq!(c.db.combination_count().unwrap(), 2);
}

#[test]
fn test_appointments_share_combination_and_type_link() {
    let c = setup_clinic();
    let dental = BookingType::new("Dental Cleaning".into(), 1.5);
    c.db.insert_booking_type(&dental).unwrap();
    let svc = service(&c.db);

    let mut first = svc.draft_appointment(c.max.id.clone(), at("2025-12-01 10:00"), Some(&dental));
    first.room_id = Some(c.room1.id.clone());
    first.provider_id = Some(c.smith.id.clone());
    let first = svc.create_appointment(first).unwrap();

    let mut second = svc.draft_appointment(c.luna.id.clone(), at("2025-12-02 10:00"), Some(&dental));
    second.room_id = Some(c.room1.id.clone());
    second.provider_id = Some(c.smith.id.clone());
    let second = svc.create_appointment(second).unwrap();

    assert_eq!(first.combination_id, second.combination_id);
    assert_eq!(first.duration_hours, 1.5);
    assert_eq!(first.name, "Max - Dental Cleaning - 2025-12-01 10:00");
    assert_eq!(c.db.list_type_combinations(&dental.id).unwrap().len(), 1);
}

#[test]
fn test_renaming_room_or_provider_renames_combination() {
    let c = setup_clinic();
    let resolver = CombinationResolver::new(&c.db);
    let room_only = resolver
        .resolve_combination(Some(&c.room1), None)
        .unwrap()
        .unwrap();
    let pair = resolver
        .resolve_combination(Some(&c.room1), Some(&c.smith))
        .unwrap()
        .unwrap();
    assert_eq!(pair.name, "Room 1 + Dr. Smith");

    let mut room1 = c.room1.clone();
    room1.name = "Surgery Suite".into();
    assert!(c.db.update_room(&room1).unwrap());

    let mut smith = c.smith.clone();
    smith.name = "Dr. Smith-Brown".into();
    assert!(c.db.update_provider(&mut smith).unwrap());

    let resource = c.db.get_resource(room1.resource_id.as_deref().unwrap()).unwrap().unwrap();
    assert_eq!(resource.name, "Surgery Suite");
    assert_eq!(
        c.db.get_combination(&room_only.id).unwrap().unwrap().name,
        "Surgery Suite"
    );
    assert_eq!(
        c.db.get_combination(&pair.id).unwrap().unwrap().name,
        "Surgery Suite + Dr. Smith-Brown"
    );
}

#[test]
fn test_provider_losing_provider_type_drops_resource() {
    let c = setup_clinic();
    let receptionist = ProviderType::new("Receptionist".into(), false);
    c.db.insert_provider_type(&receptionist).unwrap();

    let combination = CombinationResolver::new(&c.db)
        .resolve_combination(Some(&c.room1), Some(&c.smith))
        .unwrap()
        .unwrap();

    let mut smith = c.smith.clone();
    smith.provider_type_id = Some(receptionist.id.clone());
    c.db.update_provider(&mut smith).unwrap();

    assert!(smith.resource_id.is_none());
    assert!(c.db.get_combination(&combination.id).unwrap().is_none());
    assert!(CombinationResolver::new(&c.db)
        .resolve_combination(None, Some(&smith))
        .unwrap()
        .is_none());
}

#[test]
fn test_backfill_links_imported_rooms_and_providers() {
    let c = setup_clinic();
    c.db.conn()
        .execute_batch(
            r#"
            INSERT INTO rooms (id, name) VALUES ('imported-room', 'Surgery Suite');
            INSERT INTO providers (id, name, provider_type_id)
                SELECT 'imported-vet', 'Dr. Brown', provider_type_id FROM providers LIMIT 1;
            "#,
        )
        .unwrap();

    let report = c.db.ensure_linked_resources().unwrap();
    assert_eq!(report.rooms, 1);
    assert_eq!(report.providers, 1);

    assert!(c.db.get_room("imported-room").unwrap().unwrap().resource_id.is_some());
    assert!(c.db.get_provider("imported-vet").unwrap().unwrap().resource_id.is_some());

    // Second run finds nothing to do
    let again = c.db.ensure_linked_resources().unwrap();
    assert_eq!((again.rooms, again.providers), (0, 0));
}

// ============================================================================
// Workflow
// ============================================================================

#[test]
fn test_moving_appointment_clears_conflict() {
    let c = setup_clinic();
    let svc = service(&c.db);
    let a = book(&c, &c.max, "2025-12-01 10:00", 1.0, Some(&c.smith), Some(&c.room1));
    let mut b = book(&c, &c.luna, "2025-12-01 10:30", 1.0, Some(&c.smith), Some(&c.room2));
    assert!(svc.overlap_report(&a.id).unwrap().has_overlap());

    b.start = at("2025-12-01 13:00");
    let b = svc.update_appointment(b).unwrap();
    assert_eq!(b.name, "Luna - Regular Checkup - 2025-12-01 13:00");
    assert!(!svc.overlap_report(&a.id).unwrap().has_overlap());
}

#[test]
fn test_rescheduling_into_the_past_is_rejected() {
    let c = setup_clinic();
    let svc = service(&c.db);
    let mut a = book(&c, &c.max, "2025-12-01 10:00", 1.0, None, None);

    a.start = at("2025-10-01 10:00");
    assert!(svc.update_appointment(a.clone()).is_err());

    let stored = c.db.get_appointment(&a.id).unwrap().unwrap();
    assert_eq!(stored.start, at("2025-12-01 10:00"));
    assert_eq!(stored.state, AppointmentState::Scheduled);
}
