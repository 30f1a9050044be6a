//! Resource combination database operations.

use rusqlite::{params, OptionalExtension};
use sha2::{Digest, Sha256};

use super::{Database, DbResult};
use crate::models::{Combination, TypeCombinationLink};

/// Canonical member set: sorted and de-duplicated.
pub fn canonical_members(resource_ids: &[String]) -> Vec<String> {
    let mut members = resource_ids.to_vec();
    members.sort();
    members.dedup();
    members
}

/// Members in first-seen order with repeats dropped.
fn display_order(resource_ids: &[String]) -> Vec<&String> {
    let mut members: Vec<&String> = Vec::with_capacity(resource_ids.len());
    for id in resource_ids {
        if !members.contains(&id) {
            members.push(id);
        }
    }
    members
}

/// Content key identifying a member set regardless of order or repeats.
pub fn member_key(resource_ids: &[String]) -> String {
    let members = canonical_members(resource_ids);
    let mut hasher = Sha256::new();
    for id in &members {
        hasher.update(id.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

impl Database {
    /// Find the combination with exactly these members, creating it if missing.
    ///
    /// The insert is an upsert on the unique member key, so concurrent callers
    /// resolving the same set always end up with the same row. An empty set
    /// resolves to `None`.
    pub fn find_or_create_combination(&self, resource_ids: &[String]) -> DbResult<Option<Combination>> {
        if resource_ids.is_empty() {
            return Ok(None);
        }
        let key = member_key(resource_ids);

        self.with_savepoint("find_or_create_combination", || {
            let name = self.combination_name(resource_ids)?;
            let id = uuid::Uuid::new_v4().to_string();

            let inserted = self.conn.execute(
                r#"
                INSERT INTO resource_combinations (id, name, member_key)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(member_key) DO NOTHING
                "#,
                params![id, name, key],
            )?;

            if inserted > 0 {
                for (position, resource_id) in display_order(resource_ids).into_iter().enumerate() {
                    self.conn.execute(
                        r#"
                        INSERT INTO combination_resources (combination_id, resource_id, position)
                        VALUES (?1, ?2, ?3)
                        "#,
                        params![id, resource_id, position as i64],
                    )?;
                }
                tracing::info!(combination_id = %id, name = %name, "Created resource combination");
            }

            self.find_combination_by_key(&key)
        })
    }

    /// Find the combination with exactly these members, without creating one.
    pub fn find_combination_by_members(&self, resource_ids: &[String]) -> DbResult<Option<Combination>> {
        if resource_ids.is_empty() {
            return Ok(None);
        }
        self.find_combination_by_key(&member_key(resource_ids))
    }

    fn find_combination_by_key(&self, key: &str) -> DbResult<Option<Combination>> {
        let id: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM resource_combinations WHERE member_key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()?;

        match id {
            Some(id) => self.get_combination(&id),
            None => Ok(None),
        }
    }

    /// Get a combination with its members.
    pub fn get_combination(&self, id: &str) -> DbResult<Option<Combination>> {
        let header: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT id, name FROM resource_combinations WHERE id = ?",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((id, name)) = header else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            r#"
            SELECT resource_id FROM combination_resources
            WHERE combination_id = ?
            ORDER BY resource_id
            "#,
        )?;
        let resource_ids = stmt
            .query_map([&id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(Some(Combination {
            id,
            name,
            resource_ids,
        }))
    }

    /// Number of stored combinations.
    pub fn combination_count(&self) -> DbResult<u32> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM resource_combinations", [], |row| row.get(0))?;
        Ok(count as u32)
    }

    /// Display name: member resource names joined with " + ", in the given order.
    fn combination_name(&self, resource_ids: &[String]) -> DbResult<String> {
        let mut names: Vec<String> = Vec::new();
        for resource_id in display_order(resource_ids) {
            let name = self
                .get_resource(resource_id)?
                .map(|r| r.name)
                .unwrap_or_else(|| resource_id.clone());
            names.push(name);
        }
        Ok(names.join(" + "))
    }

    /// Recompute the name of every combination containing `resource_id`.
    ///
    /// Called after a resource is renamed. Returns the number of combinations
    /// whose name changed.
    pub fn refresh_combination_names(&self, resource_id: &str) -> DbResult<usize> {
        let mut stmt = self.conn.prepare(
            "SELECT combination_id FROM combination_resources WHERE resource_id = ?",
        )?;
        let combination_ids = stmt
            .query_map([resource_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        let mut members_stmt = self.conn.prepare(
            r#"
            SELECT resource_id FROM combination_resources
            WHERE combination_id = ?
            ORDER BY position, resource_id
            "#,
        )?;

        let mut changed = 0;
        for combination_id in combination_ids {
            let members = members_stmt
                .query_map([&combination_id], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            let name = self.combination_name(&members)?;
            changed += self.conn.execute(
                "UPDATE resource_combinations SET name = ?2 WHERE id = ?1 AND name != ?2",
                params![combination_id, name],
            )?;
        }
        Ok(changed)
    }

    /// Make a combination selectable for a booking type. Returns true if newly linked.
    pub fn link_type_combination(
        &self,
        type_id: &str,
        combination_id: &str,
        sequence: i64,
    ) -> DbResult<bool> {
        let inserted = self.conn.execute(
            r#"
            INSERT INTO type_combinations (type_id, combination_id, sequence)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(type_id, combination_id) DO NOTHING
            "#,
            params![type_id, combination_id, sequence],
        )?;
        if inserted > 0 {
            tracing::info!(type_id, combination_id, "Linked combination to booking type");
        }
        Ok(inserted > 0)
    }

    /// Combinations selectable for a booking type, by sequence.
    pub fn list_type_combinations(&self, type_id: &str) -> DbResult<Vec<TypeCombinationLink>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT type_id, combination_id, sequence
            FROM type_combinations
            WHERE type_id = ?
            ORDER BY sequence, combination_id
            "#,
        )?;
        let rows = stmt.query_map([type_id], |row| {
            Ok(TypeCombinationLink {
                type_id: row.get(0)?,
                combination_id: row.get(1)?,
                sequence: row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
