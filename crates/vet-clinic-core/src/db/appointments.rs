//! Appointment database operations.

use chrono::NaiveDateTime;
use rusqlite::{params, OptionalExtension};

use super::{timestamp_from_sql, timestamp_to_sql, Database, DbError, DbResult};
use crate::models::{Appointment, AppointmentKind, AppointmentState};

const APPOINTMENT_COLUMNS: &str = "id, name, patient_id, kind, booking_type_id, start, \
                                   duration_hours, provider_id, room_id, combination_id, state, \
                                   reason, diagnosis, treatment, prescription, notes, \
                                   created_at, updated_at";

/// Intermediate row struct for database mapping.
struct AppointmentRow {
    id: String,
    name: String,
    patient_id: String,
    kind: String,
    booking_type_id: Option<String>,
    start: String,
    duration_hours: f64,
    provider_id: Option<String>,
    room_id: Option<String>,
    combination_id: Option<String>,
    state: String,
    reason: Option<String>,
    diagnosis: Option<String>,
    treatment: Option<String>,
    prescription: Option<String>,
    notes: Option<String>,
    created_at: String,
    updated_at: String,
}

fn appointment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        name: row.get(1)?,
        patient_id: row.get(2)?,
        kind: row.get(3)?,
        booking_type_id: row.get(4)?,
        start: row.get(5)?,
        duration_hours: row.get(6)?,
        provider_id: row.get(7)?,
        room_id: row.get(8)?,
        combination_id: row.get(9)?,
        state: row.get(10)?,
        reason: row.get(11)?,
        diagnosis: row.get(12)?,
        treatment: row.get(13)?,
        prescription: row.get(14)?,
        notes: row.get(15)?,
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    })
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = DbError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let kind = AppointmentKind::parse(&row.kind)
            .ok_or_else(|| DbError::Constraint(format!("Unknown appointment kind: {}", row.kind)))?;
        let state = AppointmentState::parse(&row.state)
            .ok_or_else(|| DbError::Constraint(format!("Unknown appointment state: {}", row.state)))?;

        Ok(Appointment {
            id: row.id,
            name: row.name,
            patient_id: row.patient_id,
            kind,
            booking_type_id: row.booking_type_id,
            start: timestamp_from_sql(&row.start)?,
            duration_hours: row.duration_hours,
            provider_id: row.provider_id,
            room_id: row.room_id,
            combination_id: row.combination_id,
            state,
            reason: row.reason,
            diagnosis: row.diagnosis,
            treatment: row.treatment,
            prescription: row.prescription,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl Database {
    /// Insert a new appointment.
    pub fn insert_appointment(&self, appt: &Appointment) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO appointments (
                id, name, patient_id, kind, booking_type_id, start, duration_hours,
                provider_id, room_id, combination_id, state, reason, diagnosis,
                treatment, prescription, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            "#,
            params![
                appt.id,
                appt.name,
                appt.patient_id,
                appt.kind.as_str(),
                appt.booking_type_id,
                timestamp_to_sql(&appt.start),
                appt.duration_hours,
                appt.provider_id,
                appt.room_id,
                appt.combination_id,
                appt.state.as_str(),
                appt.reason,
                appt.diagnosis,
                appt.treatment,
                appt.prescription,
                appt.notes,
                appt.created_at,
                appt.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing appointment.
    pub fn update_appointment(&self, appt: &Appointment) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE appointments SET
                name = ?2,
                patient_id = ?3,
                kind = ?4,
                booking_type_id = ?5,
                start = ?6,
                duration_hours = ?7,
                provider_id = ?8,
                room_id = ?9,
                combination_id = ?10,
                state = ?11,
                reason = ?12,
                diagnosis = ?13,
                treatment = ?14,
                prescription = ?15,
                notes = ?16,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                appt.id,
                appt.name,
                appt.patient_id,
                appt.kind.as_str(),
                appt.booking_type_id,
                timestamp_to_sql(&appt.start),
                appt.duration_hours,
                appt.provider_id,
                appt.room_id,
                appt.combination_id,
                appt.state.as_str(),
                appt.reason,
                appt.diagnosis,
                appt.treatment,
                appt.prescription,
                appt.notes,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Write only the lifecycle state.
    pub fn set_appointment_state(&self, id: &str, state: AppointmentState) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE appointments SET state = ?2, updated_at = datetime('now') WHERE id = ?1",
            params![id, state.as_str()],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, id: &str) -> DbResult<Option<Appointment>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM appointments WHERE id = ?", APPOINTMENT_COLUMNS),
                [id],
                appointment_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List a patient's appointments, most recent first.
    pub fn list_appointments_for_patient(&self, patient_id: &str) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM appointments WHERE patient_id = ? ORDER BY start DESC, id",
            APPOINTMENT_COLUMNS
        ))?;

        let rows = stmt.query_map([patient_id], appointment_row)?;

        let mut appointments = Vec::new();
        for row in rows {
            appointments.push(row?.try_into()?);
        }
        Ok(appointments)
    }

    /// Active appointments (not done/cancelled) that start strictly before `before`
    /// and share the given provider or room, most recent first.
    ///
    /// `exclude_id` drops the candidate itself. Callers still check the other
    /// end of the interval.
    pub fn list_active_appointments_starting_before(
        &self,
        before: &NaiveDateTime,
        exclude_id: Option<&str>,
        provider_id: Option<&str>,
        room_id: Option<&str>,
    ) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM appointments
            WHERE state NOT IN ('cancelled', 'done')
              AND start < ?1
              AND (?2 IS NULL OR id != ?2)
              AND ((?3 IS NOT NULL AND provider_id = ?3) OR (?4 IS NOT NULL AND room_id = ?4))
            ORDER BY start DESC, id
            "#,
            APPOINTMENT_COLUMNS
        ))?;

        let rows = stmt.query_map(
            params![timestamp_to_sql(before), exclude_id, provider_id, room_id],
            appointment_row,
        )?;

        let mut appointments = Vec::new();
        for row in rows {
            appointments.push(row?.try_into()?);
        }
        Ok(appointments)
    }

    /// Delete an appointment.
    pub fn delete_appointment(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM appointments WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}
