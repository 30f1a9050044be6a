//! Owner database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::Owner;

const OWNER_COLUMNS: &str = "id, name, email, phone, mobile, street, street2, city, state, \
                             zip, country, notes, active, created_at, updated_at";

fn owner_from_row(row: &Row<'_>) -> rusqlite::Result<Owner> {
    Ok(Owner {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        mobile: row.get(4)?,
        street: row.get(5)?,
        street2: row.get(6)?,
        city: row.get(7)?,
        state: row.get(8)?,
        zip: row.get(9)?,
        country: row.get(10)?,
        notes: row.get(11)?,
        active: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

impl Database {
    /// Insert a new owner.
    pub fn insert_owner(&self, owner: &Owner) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO owners (
                id, name, email, phone, mobile, street, street2, city, state,
                zip, country, notes, active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                owner.id,
                owner.name,
                owner.email,
                owner.phone,
                owner.mobile,
                owner.street,
                owner.street2,
                owner.city,
                owner.state,
                owner.zip,
                owner.country,
                owner.notes,
                owner.active,
                owner.created_at,
                owner.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing owner.
    pub fn update_owner(&self, owner: &Owner) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE owners SET
                name = ?2,
                email = ?3,
                phone = ?4,
                mobile = ?5,
                street = ?6,
                street2 = ?7,
                city = ?8,
                state = ?9,
                zip = ?10,
                country = ?11,
                notes = ?12,
                active = ?13,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                owner.id,
                owner.name,
                owner.email,
                owner.phone,
                owner.mobile,
                owner.street,
                owner.street2,
                owner.city,
                owner.state,
                owner.zip,
                owner.country,
                owner.notes,
                owner.active,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get an owner by ID.
    pub fn get_owner(&self, id: &str) -> DbResult<Option<Owner>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM owners WHERE id = ?", OWNER_COLUMNS),
                [id],
                owner_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List owners, ordered by name.
    pub fn list_owners(&self, active_only: bool) -> DbResult<Vec<Owner>> {
        let sql = if active_only {
            format!("SELECT {} FROM owners WHERE active = 1 ORDER BY name", OWNER_COLUMNS)
        } else {
            format!("SELECT {} FROM owners ORDER BY name", OWNER_COLUMNS)
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], owner_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Number of pets registered to an owner.
    pub fn owner_patient_count(&self, owner_id: &str) -> DbResult<u32> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM patients WHERE owner_id = ?",
            [owner_id],
            |row| row.get(0),
        )?;
        Ok(count as u32)
    }
}
