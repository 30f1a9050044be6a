//! Problem list and medical note database operations.

use rusqlite::{params, OptionalExtension};

use super::{
    date_from_sql, date_to_sql, optional_date_from_sql, timestamp_from_sql, timestamp_to_sql,
    Database, DbError, DbResult,
};
use crate::models::{MedicalNote, NoteType, Problem, ProblemStatus};

// ============================================================================
// Problems
// ============================================================================

const PROBLEM_COLUMNS: &str =
    "id, name, patient_id, status, onset_date, resolved_date, diagnosis_code, notes, active";

struct ProblemRow {
    id: String,
    name: String,
    patient_id: String,
    status: String,
    onset_date: String,
    resolved_date: Option<String>,
    diagnosis_code: Option<String>,
    notes: Option<String>,
    active: bool,
}

fn problem_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProblemRow> {
    Ok(ProblemRow {
        id: row.get(0)?,
        name: row.get(1)?,
        patient_id: row.get(2)?,
        status: row.get(3)?,
        onset_date: row.get(4)?,
        resolved_date: row.get(5)?,
        diagnosis_code: row.get(6)?,
        notes: row.get(7)?,
        active: row.get(8)?,
    })
}

impl TryFrom<ProblemRow> for Problem {
    type Error = DbError;

    fn try_from(row: ProblemRow) -> Result<Self, Self::Error> {
        let status = ProblemStatus::parse(&row.status)
            .ok_or_else(|| DbError::Constraint(format!("Unknown problem status: {}", row.status)))?;

        Ok(Problem {
            id: row.id,
            name: row.name,
            patient_id: row.patient_id,
            status,
            onset_date: date_from_sql(&row.onset_date)?,
            resolved_date: optional_date_from_sql(row.resolved_date)?,
            diagnosis_code: row.diagnosis_code,
            notes: row.notes,
            active: row.active,
        })
    }
}

// ============================================================================
// Medical notes
// ============================================================================

const NOTE_COLUMNS: &str = "id, patient_id, appointment_id, date, author_id, note_type, \
                            subjective, objective, assessment, plan, content, is_private, \
                            is_important, active";

struct MedicalNoteRow {
    id: String,
    patient_id: String,
    appointment_id: Option<String>,
    date: String,
    author_id: String,
    note_type: String,
    subjective: Option<String>,
    objective: Option<String>,
    assessment: Option<String>,
    plan: Option<String>,
    content: Option<String>,
    is_private: bool,
    is_important: bool,
    active: bool,
}

fn note_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MedicalNoteRow> {
    Ok(MedicalNoteRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        appointment_id: row.get(2)?,
        date: row.get(3)?,
        author_id: row.get(4)?,
        note_type: row.get(5)?,
        subjective: row.get(6)?,
        objective: row.get(7)?,
        assessment: row.get(8)?,
        plan: row.get(9)?,
        content: row.get(10)?,
        is_private: row.get(11)?,
        is_important: row.get(12)?,
        active: row.get(13)?,
    })
}

impl TryFrom<MedicalNoteRow> for MedicalNote {
    type Error = DbError;

    fn try_from(row: MedicalNoteRow) -> Result<Self, Self::Error> {
        let note_type = NoteType::parse(&row.note_type)
            .ok_or_else(|| DbError::Constraint(format!("Unknown note type: {}", row.note_type)))?;

        Ok(MedicalNote {
            id: row.id,
            patient_id: row.patient_id,
            appointment_id: row.appointment_id,
            date: timestamp_from_sql(&row.date)?,
            author_id: row.author_id,
            note_type,
            subjective: row.subjective,
            objective: row.objective,
            assessment: row.assessment,
            plan: row.plan,
            content: row.content,
            is_private: row.is_private,
            is_important: row.is_important,
            active: row.active,
        })
    }
}

impl Database {
    /// Insert a problem list entry.
    pub fn insert_problem(&self, problem: &Problem) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO problems (
                id, name, patient_id, status, onset_date, resolved_date,
                diagnosis_code, notes, active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                problem.id,
                problem.name,
                problem.patient_id,
                problem.status.as_str(),
                date_to_sql(&problem.onset_date),
                problem.resolved_date.as_ref().map(date_to_sql),
                problem.diagnosis_code,
                problem.notes,
                problem.active,
            ],
        )?;
        Ok(())
    }

    /// Update a problem list entry.
    pub fn update_problem(&self, problem: &Problem) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE problems SET
                name = ?2,
                status = ?3,
                onset_date = ?4,
                resolved_date = ?5,
                diagnosis_code = ?6,
                notes = ?7,
                active = ?8
            WHERE id = ?1
            "#,
            params![
                problem.id,
                problem.name,
                problem.status.as_str(),
                date_to_sql(&problem.onset_date),
                problem.resolved_date.as_ref().map(date_to_sql),
                problem.diagnosis_code,
                problem.notes,
                problem.active,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a problem by ID.
    pub fn get_problem(&self, id: &str) -> DbResult<Option<Problem>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM problems WHERE id = ?", PROBLEM_COLUMNS),
                [id],
                problem_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// A patient's problem list: active problems first, then by onset, newest first.
    pub fn list_problems_for_patient(&self, patient_id: &str) -> DbResult<Vec<Problem>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM problems WHERE patient_id = ? ORDER BY status, onset_date DESC, id",
            PROBLEM_COLUMNS
        ))?;

        let rows = stmt.query_map([patient_id], problem_row)?;

        let mut problems = Vec::new();
        for row in rows {
            problems.push(row?.try_into()?);
        }
        Ok(problems)
    }

    /// Insert a medical note.
    pub fn insert_medical_note(&self, note: &MedicalNote) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO medical_notes (
                id, patient_id, appointment_id, date, author_id, note_type,
                subjective, objective, assessment, plan, content,
                is_private, is_important, active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                note.id,
                note.patient_id,
                note.appointment_id,
                timestamp_to_sql(&note.date),
                note.author_id,
                note.note_type.as_str(),
                note.subjective,
                note.objective,
                note.assessment,
                note.plan,
                note.content,
                note.is_private,
                note.is_important,
                note.active,
            ],
        )?;
        Ok(())
    }

    /// Get a medical note by ID.
    pub fn get_medical_note(&self, id: &str) -> DbResult<Option<MedicalNote>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM medical_notes WHERE id = ?", NOTE_COLUMNS),
                [id],
                note_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// A patient's notes, newest first.
    pub fn list_notes_for_patient(&self, patient_id: &str) -> DbResult<Vec<MedicalNote>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM medical_notes WHERE patient_id = ? ORDER BY date DESC, id DESC",
            NOTE_COLUMNS
        ))?;

        let rows = stmt.query_map([patient_id], note_row)?;

        let mut notes = Vec::new();
        for row in rows {
            notes.push(row?.try_into()?);
        }
        Ok(notes)
    }

    /// Attach a note to a problem. Returns true if newly linked.
    pub fn link_problem_note(&self, problem_id: &str, note_id: &str) -> DbResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO problem_notes (problem_id, note_id) VALUES (?1, ?2)",
            params![problem_id, note_id],
        )?;
        Ok(inserted > 0)
    }

    /// Notes attached to a problem, newest first.
    pub fn list_notes_for_problem(&self, problem_id: &str) -> DbResult<Vec<MedicalNote>> {
        let columns = NOTE_COLUMNS
            .split(", ")
            .map(|c| format!("n.{}", c.trim()))
            .collect::<Vec<_>>()
            .join(", ");
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM medical_notes n
            JOIN problem_notes pn ON pn.note_id = n.id
            WHERE pn.problem_id = ?
            ORDER BY n.date DESC, n.id DESC
            "#,
            columns
        ))?;

        let rows = stmt.query_map([problem_id], note_row)?;

        let mut notes = Vec::new();
        for row in rows {
            notes.push(row?.try_into()?);
        }
        Ok(notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Owner, Patient, Provider, ProviderType, Species};
    use chrono::{NaiveDate, NaiveDateTime};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    struct Fixture {
        db: Database,
        patient: Patient,
        vet: Provider,
    }

    fn setup() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let owner = Owner::new("John Doe".into());
        db.insert_owner(&owner).unwrap();
        let species = Species::new("Cat".into(), None);
        db.insert_species(&species).unwrap();
        let patient = Patient::new("Whiskers".into(), owner.id, species.id);
        db.insert_patient(&patient).unwrap();

        let vet_type = ProviderType::new("Veterinarian".into(), true);
        db.insert_provider_type(&vet_type).unwrap();
        let mut vet = Provider::new("Dr. Smith".into(), Some(vet_type.id));
        db.insert_provider(&mut vet).unwrap();

        Fixture { db, patient, vet }
    }

    #[test]
    fn test_problem_lifecycle() {
        let f = setup();

        let mut problem = Problem::new("Otitis externa".into(), f.patient.id.clone(), date(2025, 3, 1));
        problem.diagnosis_code = Some("H60".into());
        f.db.insert_problem(&problem).unwrap();
        assert_eq!(f.db.get_problem(&problem.id).unwrap().unwrap(), problem);

        problem.mark_resolved(date(2025, 4, 1));
        assert!(f.db.update_problem(&problem).unwrap());

        let retrieved = f.db.get_problem(&problem.id).unwrap().unwrap();
        assert_eq!(retrieved.status, ProblemStatus::Resolved);
        assert_eq!(retrieved.resolved_date, Some(date(2025, 4, 1)));
    }

    #[test]
    fn test_resolved_problem_without_date_rejected() {
        let f = setup();
        let mut problem = Problem::new("Dermatitis".into(), f.patient.id.clone(), date(2025, 3, 1));
        problem.status = ProblemStatus::Resolved;
        assert!(f.db.insert_problem(&problem).is_err());
    }

    #[test]
    fn test_problem_list_active_first() {
        let f = setup();

        let mut old = Problem::new("Fracture".into(), f.patient.id.clone(), date(2024, 1, 1));
        old.mark_resolved(date(2024, 3, 1));
        let recent = Problem::new("Obesity".into(), f.patient.id.clone(), date(2025, 6, 1));
        let older_active = Problem::new("Arthritis".into(), f.patient.id.clone(), date(2023, 6, 1));
        for p in [&old, &recent, &older_active] {
            f.db.insert_problem(p).unwrap();
        }

        let names: Vec<String> = f
            .db
            .list_problems_for_patient(&f.patient.id)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Obesity", "Arthritis", "Fracture"]);

        let summary = f.db.patient_summary(&f.patient.id).unwrap();
        assert_eq!(summary.problem_count, 3);
        assert_eq!(summary.active_problem_count, 2);
    }

    #[test]
    fn test_notes_newest_first_and_problem_links() {
        let f = setup();

        let mut soap = MedicalNote::new(
            f.patient.id.clone(),
            f.vet.id.clone(),
            NoteType::Soap,
            at("2025-12-01 10:00"),
        );
        soap.subjective = Some("Scratching left ear".into());
        soap.assessment = Some("Otitis externa".into());
        let call = MedicalNote::new(
            f.patient.id.clone(),
            f.vet.id.clone(),
            NoteType::Communication,
            at("2025-12-03 16:15"),
        );
        f.db.insert_medical_note(&soap).unwrap();
        f.db.insert_medical_note(&call).unwrap();
        assert_eq!(f.db.get_medical_note(&soap.id).unwrap().unwrap(), soap);

        let notes = f.db.list_notes_for_patient(&f.patient.id).unwrap();
        assert_eq!(notes[0].id, call.id);
        assert_eq!(notes[1].id, soap.id);

        let problem = Problem::new("Otitis externa".into(), f.patient.id.clone(), date(2025, 12, 1));
        f.db.insert_problem(&problem).unwrap();
        assert!(f.db.link_problem_note(&problem.id, &soap.id).unwrap());
        assert!(!f.db.link_problem_note(&problem.id, &soap.id).unwrap());

        let linked = f.db.list_notes_for_problem(&problem.id).unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].id, soap.id);
    }

    #[test]
    fn test_note_requires_known_author() {
        let f = setup();
        let note = MedicalNote::new(
            f.patient.id.clone(),
            "nobody".into(),
            NoteType::Internal,
            at("2025-12-01 10:00"),
        );
        assert!(f.db.insert_medical_note(&note).is_err());
    }
}
