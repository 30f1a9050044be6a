//! Patient models.
//!
//! Weight is stored in kilograms only and the birth date is the single source
//! of truth for age. Display values in other units, and age spans, are derived
//! on demand by the pure functions below.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Pounds per kilogram.
pub const LBS_PER_KG: f64 = 2.20462;

/// Kilograms per pound.
pub const KG_PER_LB: f64 = 0.453592;

/// Convert kilograms to pounds.
pub fn kg_to_lbs(kg: f64) -> f64 {
    kg * LBS_PER_KG
}

/// Convert pounds to kilograms.
pub fn lbs_to_kg(lbs: f64) -> f64 {
    lbs * KG_PER_LB
}

/// Patient sex.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "unknown" => Some(Gender::Unknown),
            _ => None,
        }
    }
}

/// Unit a patient's weight is shown and entered in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lbs,
}

impl WeightUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lbs => "lbs",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "kg" => Some(WeightUnit::Kg),
            "lbs" => Some(WeightUnit::Lbs),
            _ => None,
        }
    }

    /// Express a kilogram value in this unit.
    pub fn from_kg(&self, kg: f64) -> f64 {
        match self {
            WeightUnit::Kg => kg,
            WeightUnit::Lbs => kg_to_lbs(kg),
        }
    }

    /// Convert a value in this unit back to kilograms.
    pub fn to_kg(&self, value: f64) -> f64 {
        match self {
            WeightUnit::Kg => value,
            WeightUnit::Lbs => lbs_to_kg(value),
        }
    }
}

/// Whole years and leftover months of a patient's age.
///
/// Uses the clinic's approximation of 365-day years and 30-day months.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgeSpan {
    pub years: u32,
    pub months: u32,
}

impl AgeSpan {
    /// Age between a birth date and `today`. Future birth dates count as zero.
    pub fn between(birth_date: NaiveDate, today: NaiveDate) -> Self {
        let days = (today - birth_date).num_days().max(0);
        Self {
            years: (days / 365) as u32,
            months: ((days % 365) / 30) as u32,
        }
    }

    /// Human-readable label, e.g. "2 year(s), 3 month(s)".
    pub fn label(&self) -> String {
        if self.years > 0 {
            format!("{} year(s), {} month(s)", self.years, self.months)
        } else {
            format!("{} month(s)", self.months)
        }
    }
}

/// Birth date implied by an entered age, using calendar month arithmetic.
pub fn birth_date_from_age(years: u32, months: u32, today: NaiveDate) -> Option<NaiveDate> {
    let total = years.checked_mul(12)?.checked_add(months)?;
    today.checked_sub_months(Months::new(total))
}

/// A patient (animal) record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Local UUID
    pub id: String,
    /// Patient name
    pub name: String,
    /// Owner ID (required)
    pub owner_id: String,
    /// Species ID (required)
    pub species_id: String,
    pub breed: Option<String>,
    pub gender: Gender,
    /// Date of birth, exact or derived from an entered age
    pub birth_date: Option<NaiveDate>,
    /// True when the birth date was derived from an entered age
    pub birth_date_approximate: bool,
    /// Color/markings
    pub color: Option<String>,
    pub microchip_number: Option<String>,
    /// Weight in kg (the only stored weight)
    pub weight_kg: Option<f64>,
    /// Unit the weight is displayed in
    pub weight_unit: WeightUnit,
    /// Spayed/neutered
    pub neutered: bool,
    /// Known allergies
    pub allergies: Option<String>,
    pub active: bool,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Patient {
    /// Create a new patient with required fields.
    pub fn new(name: String, owner_id: String, species_id: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            owner_id,
            species_id,
            breed: None,
            gender: Gender::Unknown,
            birth_date: None,
            birth_date_approximate: false,
            color: None,
            microchip_number: None,
            weight_kg: None,
            weight_unit: WeightUnit::Kg,
            neutered: false,
            allergies: None,
            active: true,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Weight in the patient's display unit (0.0 when unknown).
    pub fn display_weight(&self) -> f64 {
        match self.weight_kg {
            Some(kg) if kg != 0.0 => self.weight_unit.from_kg(kg),
            _ => 0.0,
        }
    }

    /// Store a weight entered in the patient's display unit.
    pub fn set_display_weight(&mut self, value: f64) {
        self.weight_kg = if value == 0.0 {
            None
        } else {
            Some(self.weight_unit.to_kg(value))
        };
    }

    /// Set an exact birth date.
    pub fn set_birth_date(&mut self, birth_date: Option<NaiveDate>) {
        self.birth_date = birth_date;
        self.birth_date_approximate = false;
    }

    /// Derive an approximate birth date from an entered age.
    ///
    /// A zero age leaves the current birth date untouched.
    pub fn set_age(&mut self, years: u32, months: u32, today: NaiveDate) {
        if years == 0 && months == 0 {
            return;
        }
        if let Some(date) = birth_date_from_age(years, months, today) {
            self.birth_date = Some(date);
            self.birth_date_approximate = true;
        }
    }

    /// Current age, if the birth date is known.
    pub fn age(&self, today: NaiveDate) -> Option<AgeSpan> {
        self.birth_date.map(|birth| AgeSpan::between(birth, today))
    }

    /// Age label, empty without a birth date.
    pub fn age_label(&self, today: NaiveDate) -> String {
        self.age(today).map(|age| age.label()).unwrap_or_default()
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

/// Aggregate counts shown on a patient record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PatientSummary {
    pub appointment_count: u32,
    pub medical_note_count: u32,
    pub problem_count: u32,
    pub active_problem_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_patient() -> Patient {
        Patient::new("Max".into(), "owner-1".into(), "species-1".into())
    }

    #[test]
    fn test_new_patient() {
        let patient = make_patient();
        assert_eq!(patient.name, "Max");
        assert_eq!(patient.gender, Gender::Unknown);
        assert_eq!(patient.weight_unit, WeightUnit::Kg);
        assert!(patient.active);
        assert_eq!(patient.id.len(), 36); // UUID format
    }

    #[test]
    fn test_weight_display_in_lbs() {
        let mut patient = make_patient();
        patient.weight_kg = Some(10.0);
        patient.weight_unit = WeightUnit::Lbs;
        assert!((patient.display_weight() - 22.0462).abs() < 1e-9);
    }

    #[test]
    fn test_set_display_weight_stores_kg() {
        let mut patient = make_patient();
        patient.weight_unit = WeightUnit::Lbs;
        patient.set_display_weight(50.0);
        assert!((patient.weight_kg.unwrap() - 22.6796).abs() < 1e-9);

        patient.set_display_weight(0.0);
        assert_eq!(patient.weight_kg, None);
        assert_eq!(patient.display_weight(), 0.0);
    }

    #[test]
    fn test_switching_unit_keeps_stored_weight() {
        let mut patient = make_patient();
        patient.set_display_weight(30.0);
        patient.weight_unit = WeightUnit::Lbs;
        assert_eq!(patient.weight_kg, Some(30.0));
        assert!((patient.display_weight() - 66.1386).abs() < 1e-9);
    }

    #[test]
    fn test_age_span() {
        let today = date(2025, 12, 1);
        let age = AgeSpan::between(today - chrono::Duration::days(730), today);
        assert_eq!(age, AgeSpan { years: 2, months: 0 });
        assert_eq!(age.label(), "2 year(s), 0 month(s)");

        let young = AgeSpan::between(today - chrono::Duration::days(95), today);
        assert_eq!(young.label(), "3 month(s)");
    }

    #[test]
    fn test_future_birth_date_is_zero_age() {
        let today = date(2025, 12, 1);
        let age = AgeSpan::between(date(2026, 1, 1), today);
        assert_eq!(age, AgeSpan { years: 0, months: 0 });
    }

    #[test]
    fn test_set_age_marks_approximate() {
        let mut patient = make_patient();
        patient.set_age(2, 3, date(2025, 12, 15));
        assert_eq!(patient.birth_date, Some(date(2023, 9, 15)));
        assert!(patient.birth_date_approximate);

        patient.set_birth_date(Some(date(2023, 9, 1)));
        assert!(!patient.birth_date_approximate);
    }

    #[test]
    fn test_zero_age_is_ignored() {
        let mut patient = make_patient();
        patient.set_birth_date(Some(date(2020, 1, 1)));
        patient.set_age(0, 0, date(2025, 1, 1));
        assert_eq!(patient.birth_date, Some(date(2020, 1, 1)));
        assert!(!patient.birth_date_approximate);
    }

    #[test]
    fn test_age_label_empty_without_birth_date() {
        let patient = make_patient();
        assert_eq!(patient.age_label(date(2025, 1, 1)), "");
    }

    #[test]
    fn test_enum_strings() {
        assert_eq!(Gender::parse("female"), Some(Gender::Female));
        assert_eq!(Gender::parse("other"), None);
        assert_eq!(WeightUnit::parse(WeightUnit::Lbs.as_str()), Some(WeightUnit::Lbs));
    }
}
