//! Patient database operations.

use rusqlite::{params, OptionalExtension};
use strsim::jaro_winkler;

use super::{date_to_sql, optional_date_from_sql, Database, DbError, DbResult};
use crate::models::{Gender, Patient, PatientSummary, WeightUnit};

const PATIENT_COLUMNS: &str = "id, name, owner_id, species_id, breed, gender, birth_date, \
                               birth_date_approximate, color, microchip_number, weight_kg, \
                               weight_unit, neutered, allergies, active, created_at, updated_at";

/// Intermediate row struct for database mapping.
struct PatientRow {
    id: String,
    name: String,
    owner_id: String,
    species_id: String,
    breed: Option<String>,
    gender: String,
    birth_date: Option<String>,
    birth_date_approximate: bool,
    color: Option<String>,
    microchip_number: Option<String>,
    weight_kg: Option<f64>,
    weight_unit: String,
    neutered: bool,
    allergies: Option<String>,
    active: bool,
    created_at: String,
    updated_at: String,
}

fn patient_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PatientRow> {
    Ok(PatientRow {
        id: row.get(0)?,
        name: row.get(1)?,
        owner_id: row.get(2)?,
        species_id: row.get(3)?,
        breed: row.get(4)?,
        gender: row.get(5)?,
        birth_date: row.get(6)?,
        birth_date_approximate: row.get(7)?,
        color: row.get(8)?,
        microchip_number: row.get(9)?,
        weight_kg: row.get(10)?,
        weight_unit: row.get(11)?,
        neutered: row.get(12)?,
        allergies: row.get(13)?,
        active: row.get(14)?,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

impl TryFrom<PatientRow> for Patient {
    type Error = DbError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        let gender = Gender::parse(&row.gender)
            .ok_or_else(|| DbError::Constraint(format!("Unknown gender: {}", row.gender)))?;
        let weight_unit = WeightUnit::parse(&row.weight_unit)
            .ok_or_else(|| DbError::Constraint(format!("Unknown weight unit: {}", row.weight_unit)))?;

        Ok(Patient {
            id: row.id,
            name: row.name,
            owner_id: row.owner_id,
            species_id: row.species_id,
            breed: row.breed,
            gender,
            birth_date: optional_date_from_sql(row.birth_date)?,
            birth_date_approximate: row.birth_date_approximate,
            color: row.color,
            microchip_number: row.microchip_number,
            weight_kg: row.weight_kg,
            weight_unit,
            neutered: row.neutered,
            allergies: row.allergies,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Escape LIKE wildcards with a backslash.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl Database {
    /// Insert a new patient.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO patients (
                id, name, owner_id, species_id, breed, gender, birth_date,
                birth_date_approximate, color, microchip_number, weight_kg,
                weight_unit, neutered, allergies, active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
            params![
                patient.id,
                patient.name,
                patient.owner_id,
                patient.species_id,
                patient.breed,
                patient.gender.as_str(),
                patient.birth_date.as_ref().map(date_to_sql),
                patient.birth_date_approximate,
                patient.color,
                patient.microchip_number,
                patient.weight_kg,
                patient.weight_unit.as_str(),
                patient.neutered,
                patient.allergies,
                patient.active,
                patient.created_at,
                patient.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing patient.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                name = ?2,
                owner_id = ?3,
                species_id = ?4,
                breed = ?5,
                gender = ?6,
                birth_date = ?7,
                birth_date_approximate = ?8,
                color = ?9,
                microchip_number = ?10,
                weight_kg = ?11,
                weight_unit = ?12,
                neutered = ?13,
                allergies = ?14,
                active = ?15,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                patient.id,
                patient.name,
                patient.owner_id,
                patient.species_id,
                patient.breed,
                patient.gender.as_str(),
                patient.birth_date.as_ref().map(date_to_sql),
                patient.birth_date_approximate,
                patient.color,
                patient.microchip_number,
                patient.weight_kg,
                patient.weight_unit.as_str(),
                patient.neutered,
                patient.allergies,
                patient.active,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM patients WHERE id = ?", PATIENT_COLUMNS),
                [id],
                patient_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Search patients by name (prefix match). `%` and `_` in the query match
    /// literally.
    pub fn search_patients(&self, query: &str, limit: usize) -> DbResult<Vec<Patient>> {
        let pattern = format!("{}%", escape_like(query));
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM patients WHERE name LIKE ? ESCAPE '\\' ORDER BY name LIMIT ?",
            PATIENT_COLUMNS
        ))?;

        let rows = stmt.query_map(params![pattern, limit as i64], patient_row)?;

        let mut patients = Vec::new();
        for row in rows {
            patients.push(row?.try_into()?);
        }
        Ok(patients)
    }

    /// Typo-tolerant name search over active patients, best match first.
    ///
    /// Scores with Jaro-Winkler similarity on lowercased names and keeps
    /// matches at or above `threshold`.
    pub fn fuzzy_search_patients(
        &self,
        query: &str,
        threshold: f64,
        limit: usize,
    ) -> DbResult<Vec<Patient>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f64, Patient)> = self
            .list_patients()?
            .into_iter()
            .filter(|p| p.active)
            .filter_map(|p| {
                let score = jaro_winkler(&needle, &p.name.to_lowercase());
                (score >= threshold).then_some((score, p))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.name.cmp(&b.1.name))
        });

        Ok(scored.into_iter().take(limit).map(|(_, p)| p).collect())
    }

    /// List all patients.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM patients ORDER BY name",
            PATIENT_COLUMNS
        ))?;

        let rows = stmt.query_map([], patient_row)?;

        let mut patients = Vec::new();
        for row in rows {
            patients.push(row?.try_into()?);
        }
        Ok(patients)
    }

    /// List an owner's patients.
    pub fn list_patients_for_owner(&self, owner_id: &str) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM patients WHERE owner_id = ? ORDER BY name",
            PATIENT_COLUMNS
        ))?;

        let rows = stmt.query_map([owner_id], patient_row)?;

        let mut patients = Vec::new();
        for row in rows {
            patients.push(row?.try_into()?);
        }
        Ok(patients)
    }

    /// Delete a patient.
    pub fn delete_patient(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM patients WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Appointment, note and problem counts for a patient.
    pub fn patient_summary(&self, patient_id: &str) -> DbResult<PatientSummary> {
        self.conn
            .query_row(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM appointments WHERE patient_id = ?1),
                    (SELECT COUNT(*) FROM medical_notes WHERE patient_id = ?1),
                    (SELECT COUNT(*) FROM problems WHERE patient_id = ?1),
                    (SELECT COUNT(*) FROM problems WHERE patient_id = ?1 AND status = 'active')
                "#,
                [patient_id],
                |row| {
                    Ok(PatientSummary {
                        appointment_count: row.get::<_, i64>(0)? as u32,
                        medical_note_count: row.get::<_, i64>(1)? as u32,
                        problem_count: row.get::<_, i64>(2)? as u32,
                        active_problem_count: row.get::<_, i64>(3)? as u32,
                    })
                },
            )
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Owner, Species};
    use chrono::NaiveDate;

    struct Fixture {
        db: Database,
        owner: Owner,
        species: Species,
    }

    fn setup() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let owner = Owner::new("John Doe".into());
        db.insert_owner(&owner).unwrap();
        let species = Species::new("Dog".into(), Some("DOG".into()));
        db.insert_species(&species).unwrap();
        Fixture { db, owner, species }
    }

    fn new_patient(f: &Fixture, name: &str) -> Patient {
        Patient::new(name.into(), f.owner.id.clone(), f.species.id.clone())
    }

    #[test]
    fn test_insert_and_get() {
        let f = setup();

        let mut patient = new_patient(&f, "Max");
        patient.breed = Some("Golden Retriever".into());
        patient.gender = Gender::Male;
        patient.weight_kg = Some(30.0);
        patient.weight_unit = WeightUnit::Lbs;
        patient.birth_date = NaiveDate::from_ymd_opt(2020, 5, 17);
        f.db.insert_patient(&patient).unwrap();

        let retrieved = f.db.get_patient(&patient.id).unwrap().unwrap();
        assert_eq!(retrieved, patient);
    }

    #[test]
    fn test_update_patient() {
        let f = setup();

        let mut patient = new_patient(&f, "Max");
        f.db.insert_patient(&patient).unwrap();

        patient.weight_kg = Some(32.0);
        patient.allergies = Some("Penicillin".into());
        patient.neutered = true;
        assert!(f.db.update_patient(&patient).unwrap());

        let retrieved = f.db.get_patient(&patient.id).unwrap().unwrap();
        assert_eq!(retrieved.weight_kg, Some(32.0));
        assert_eq!(retrieved.allergies, Some("Penicillin".into()));
        assert!(retrieved.neutered);
    }

    #[test]
    fn test_patient_requires_owner() {
        let f = setup();
        let patient = Patient::new("Stray".into(), "missing-owner".into(), f.species.id.clone());
        assert!(f.db.insert_patient(&patient).is_err());
    }

    #[test]
    fn test_search_patients() {
        let f = setup();

        f.db.insert_patient(&new_patient(&f, "Max")).unwrap();
        f.db.insert_patient(&new_patient(&f, "Maxine")).unwrap();
        f.db.insert_patient(&new_patient(&f, "Luna")).unwrap();

        let results = f.db.search_patients("Max", 10).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().any(|p| p.name == "Max"));
        assert!(results.iter().any(|p| p.name == "Maxine"));
    }

    #[test]
    fn test_search_wildcards_match_literally() {
        let f = setup();

        f.db.insert_patient(&new_patient(&f, "Max")).unwrap();
        f.db.insert_patient(&new_patient(&f, "100% Pure")).unwrap();
        f.db.insert_patient(&new_patient(&f, "Mr_Whiskers")).unwrap();

        assert!(f.db.search_patients("%", 10).unwrap().is_empty());
        assert!(f.db.search_patients("M_", 10).unwrap().is_empty());

        let results = f.db.search_patients("100%", 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "100% Pure");

        let results = f.db.search_patients("Mr_", 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Mr_Whiskers");
    }

    #[test]
    fn test_fuzzy_search_tolerates_typos() {
        let f = setup();

        f.db.insert_patient(&new_patient(&f, "Bella")).unwrap();
        f.db.insert_patient(&new_patient(&f, "Charlie")).unwrap();
        let mut inactive = new_patient(&f, "Belle");
        inactive.active = false;
        f.db.insert_patient(&inactive).unwrap();

        let results = f.db.fuzzy_search_patients("Bela", 0.8, 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Bella");

        assert!(f.db.fuzzy_search_patients("  ", 0.8, 10).unwrap().is_empty());
    }

    #[test]
    fn test_owner_patient_count() {
        let f = setup();
        assert_eq!(f.db.owner_patient_count(&f.owner.id).unwrap(), 0);

        f.db.insert_patient(&new_patient(&f, "Max")).unwrap();
        f.db.insert_patient(&new_patient(&f, "Luna")).unwrap();
        assert_eq!(f.db.owner_patient_count(&f.owner.id).unwrap(), 2);
        assert_eq!(f.db.list_patients_for_owner(&f.owner.id).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_summary() {
        let f = setup();
        let patient = new_patient(&f, "Charlie");
        f.db.insert_patient(&patient).unwrap();

        let summary = f.db.patient_summary(&patient.id).unwrap();
        assert_eq!(summary, PatientSummary::default());
    }
}
