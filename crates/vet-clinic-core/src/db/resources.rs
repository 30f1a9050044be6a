//! Resource, room, provider and reference-data operations.
//!
//! Rooms and providers each own a generic [`Resource`] that the combination
//! resolver works with. The linked resource follows its owner: it is created
//! with it, renamed and (de)activated with it, and deleted with it.

use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::{Database, DbError, DbResult};
use crate::models::{BookingType, Provider, ProviderType, Resource, ResourceKind, Room, Species};

/// Counts of resources created by [`Database::ensure_linked_resources`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillReport {
    pub rooms: u32,
    pub providers: u32,
}

struct ResourceRow {
    id: String,
    name: String,
    kind: String,
    active: bool,
}

impl TryFrom<ResourceRow> for Resource {
    type Error = DbError;

    fn try_from(row: ResourceRow) -> Result<Self, Self::Error> {
        let kind = ResourceKind::parse(&row.kind)
            .ok_or_else(|| DbError::Constraint(format!("Unknown resource kind: {}", row.kind)))?;
        Ok(Resource {
            id: row.id,
            name: row.name,
            kind,
            active: row.active,
        })
    }
}

fn room_from_row(row: &Row<'_>) -> rusqlite::Result<Room> {
    Ok(Room {
        id: row.get(0)?,
        name: row.get(1)?,
        sequence: row.get(2)?,
        active: row.get(3)?,
        description: row.get(4)?,
        resource_id: row.get(5)?,
    })
}

fn provider_from_row(row: &Row<'_>) -> rusqlite::Result<Provider> {
    Ok(Provider {
        id: row.get(0)?,
        name: row.get(1)?,
        provider_type_id: row.get(2)?,
        resource_id: row.get(3)?,
        active: row.get(4)?,
    })
}

fn provider_type_from_row(row: &Row<'_>) -> rusqlite::Result<ProviderType> {
    Ok(ProviderType {
        id: row.get(0)?,
        name: row.get(1)?,
        sequence: row.get(2)?,
        is_provider: row.get(3)?,
        active: row.get(4)?,
        description: row.get(5)?,
    })
}

impl Database {
    // =========================================================================
    // Resources
    // =========================================================================

    /// Insert a resource.
    pub fn insert_resource(&self, resource: &Resource) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO resources (id, name, kind, active) VALUES (?1, ?2, ?3, ?4)",
            params![resource.id, resource.name, resource.kind.as_str(), resource.active],
        )?;
        Ok(())
    }

    /// Get a resource by ID.
    pub fn get_resource(&self, id: &str) -> DbResult<Option<Resource>> {
        self.conn
            .query_row(
                "SELECT id, name, kind, active FROM resources WHERE id = ?",
                [id],
                |row| {
                    Ok(ResourceRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        kind: row.get(2)?,
                        active: row.get(3)?,
                    })
                },
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Sync a resource's name and active flag, renaming the combinations it
    /// belongs to.
    pub fn sync_resource(&self, id: &str, name: &str, active: bool) -> DbResult<bool> {
        self.with_savepoint("sync_resource", || {
            let rows_affected = self.conn.execute(
                "UPDATE resources SET name = ?2, active = ?3 WHERE id = ?1",
                params![id, name, active],
            )?;
            if rows_affected == 0 {
                return Ok(false);
            }
            let renamed = self.refresh_combination_names(id)?;
            if renamed > 0 {
                tracing::debug!(resource_id = %id, renamed, "Refreshed combination names");
            }
            Ok(true)
        })
    }

    /// Delete a resource and every combination it belongs to.
    ///
    /// A combination's identity is its member set, so one that lost a member
    /// no longer represents anything bookable.
    pub fn delete_resource(&self, id: &str) -> DbResult<bool> {
        self.with_savepoint("delete_resource", || {
            self.conn.execute(
                r#"
                DELETE FROM resource_combinations
                WHERE id IN (
                    SELECT combination_id FROM combination_resources WHERE resource_id = ?
                )
                "#,
                [id],
            )?;
            let rows_affected = self.conn.execute("DELETE FROM resources WHERE id = ?", [id])?;
            Ok(rows_affected > 0)
        })
    }

    // =========================================================================
    // Rooms
    // =========================================================================

    /// Insert a room, creating its linked material resource if it has none.
    pub fn insert_room(&self, room: &mut Room) -> DbResult<()> {
        self.with_savepoint("insert_room", || {
            if room.resource_id.is_none() {
                let resource = Resource::new(room.name.clone(), ResourceKind::Material, room.active);
                self.insert_resource(&resource)?;
                room.resource_id = Some(resource.id);
            }

            self.conn.execute(
                r#"
                INSERT INTO rooms (id, name, sequence, active, description, resource_id)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    room.id,
                    room.name,
                    room.sequence,
                    room.active,
                    room.description,
                    room.resource_id,
                ],
            )?;
            tracing::info!(room = %room.name, resource_id = ?room.resource_id, "Created room");
            Ok(())
        })
    }

    /// Update a room and sync its name/active flag to the linked resource.
    pub fn update_room(&self, room: &Room) -> DbResult<bool> {
        self.with_savepoint("update_room", || {
            let rows_affected = self.conn.execute(
                r#"
                UPDATE rooms SET
                    name = ?2,
                    sequence = ?3,
                    active = ?4,
                    description = ?5,
                    resource_id = ?6
                WHERE id = ?1
                "#,
                params![
                    room.id,
                    room.name,
                    room.sequence,
                    room.active,
                    room.description,
                    room.resource_id,
                ],
            )?;

            if rows_affected > 0 {
                if let Some(resource_id) = &room.resource_id {
                    self.sync_resource(resource_id, &room.name, room.active)?;
                }
            }
            Ok(rows_affected > 0)
        })
    }

    /// Get a room by ID.
    pub fn get_room(&self, id: &str) -> DbResult<Option<Room>> {
        self.conn
            .query_row(
                r#"
                SELECT id, name, sequence, active, description, resource_id
                FROM rooms
                WHERE id = ?
                "#,
                [id],
                room_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List rooms ordered by sequence, then name.
    pub fn list_rooms(&self, active_only: bool) -> DbResult<Vec<Room>> {
        let sql = if active_only {
            r#"
            SELECT id, name, sequence, active, description, resource_id
            FROM rooms
            WHERE active = 1
            ORDER BY sequence, name
            "#
        } else {
            r#"
            SELECT id, name, sequence, active, description, resource_id
            FROM rooms
            ORDER BY sequence, name
            "#
        };
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], room_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a room together with its linked resource.
    pub fn delete_room(&self, id: &str) -> DbResult<bool> {
        self.with_savepoint("delete_room", || {
            let Some(room) = self.get_room(id)? else {
                return Ok(false);
            };
            self.conn.execute("DELETE FROM rooms WHERE id = ?", [id])?;
            if let Some(resource_id) = &room.resource_id {
                self.delete_resource(resource_id)?;
            }
            tracing::info!(room = %room.name, "Deleted room");
            Ok(true)
        })
    }

    // =========================================================================
    // Provider Types
    // =========================================================================

    /// Insert a provider type.
    pub fn insert_provider_type(&self, provider_type: &ProviderType) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO provider_types (id, name, sequence, is_provider, active, description)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                provider_type.id,
                provider_type.name,
                provider_type.sequence,
                provider_type.is_provider,
                provider_type.active,
                provider_type.description,
            ],
        )?;
        Ok(())
    }

    /// Get a provider type by ID.
    pub fn get_provider_type(&self, id: &str) -> DbResult<Option<ProviderType>> {
        self.conn
            .query_row(
                r#"
                SELECT id, name, sequence, is_provider, active, description
                FROM provider_types
                WHERE id = ?
                "#,
                [id],
                provider_type_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List provider types ordered by sequence, then name.
    pub fn list_provider_types(&self) -> DbResult<Vec<ProviderType>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, sequence, is_provider, active, description
            FROM provider_types
            ORDER BY sequence, name
            "#,
        )?;
        let rows = stmt.query_map([], provider_type_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // =========================================================================
    // Providers
    // =========================================================================

    /// Insert a staff member, creating a resource if their type provides services.
    pub fn insert_provider(&self, provider: &mut Provider) -> DbResult<()> {
        self.with_savepoint("insert_provider", || {
            self.conn.execute(
                r#"
                INSERT INTO providers (id, name, provider_type_id, resource_id, active)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    provider.id,
                    provider.name,
                    provider.provider_type_id,
                    provider.resource_id,
                    provider.active,
                ],
            )?;
            self.ensure_provider_resource(provider)
        })
    }

    /// Update a staff member and re-apply the provider resource rule.
    pub fn update_provider(&self, provider: &mut Provider) -> DbResult<bool> {
        self.with_savepoint("update_provider", || {
            let rows_affected = self.conn.execute(
                r#"
                UPDATE providers SET
                    name = ?2,
                    provider_type_id = ?3,
                    resource_id = ?4,
                    active = ?5
                WHERE id = ?1
                "#,
                params![
                    provider.id,
                    provider.name,
                    provider.provider_type_id,
                    provider.resource_id,
                    provider.active,
                ],
            )?;
            if rows_affected == 0 {
                return Ok(false);
            }
            self.ensure_provider_resource(provider)?;
            Ok(true)
        })
    }

    /// Whether a staff member's type marks them as a service provider.
    pub fn is_provider(&self, provider: &Provider) -> DbResult<bool> {
        let Some(type_id) = &provider.provider_type_id else {
            return Ok(false);
        };
        Ok(self
            .get_provider_type(type_id)?
            .map(|t| t.is_provider)
            .unwrap_or(false))
    }

    /// Keep a staff member's linked resource consistent with their provider status.
    ///
    /// - provider without a resource: create one
    /// - provider with a resource: sync name and active flag
    /// - non-provider with a resource: delete it and clear the link
    pub fn ensure_provider_resource(&self, provider: &mut Provider) -> DbResult<()> {
        let is_provider = self.is_provider(provider)?;

        match (is_provider, provider.resource_id.clone()) {
            (true, None) => {
                let resource = Resource::new(provider.name.clone(), ResourceKind::User, provider.active);
                self.insert_resource(&resource)?;
                self.set_provider_resource(&provider.id, Some(&resource.id))?;
                tracing::info!(provider = %provider.name, resource_id = %resource.id, "Created provider resource");
                provider.resource_id = Some(resource.id);
            }
            (true, Some(resource_id)) => {
                self.sync_resource(&resource_id, &provider.name, provider.active)?;
            }
            (false, Some(resource_id)) => {
                self.set_provider_resource(&provider.id, None)?;
                self.delete_resource(&resource_id)?;
                tracing::info!(provider = %provider.name, "Removed resource from non-provider");
                provider.resource_id = None;
            }
            (false, None) => {}
        }
        Ok(())
    }

    fn set_provider_resource(&self, provider_id: &str, resource_id: Option<&str>) -> DbResult<()> {
        self.conn.execute(
            "UPDATE providers SET resource_id = ?2 WHERE id = ?1",
            params![provider_id, resource_id],
        )?;
        Ok(())
    }

    /// Get a staff member by ID.
    pub fn get_provider(&self, id: &str) -> DbResult<Option<Provider>> {
        self.conn
            .query_row(
                r#"
                SELECT id, name, provider_type_id, resource_id, active
                FROM providers
                WHERE id = ?
                "#,
                [id],
                provider_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List staff members; `providers_only` keeps those whose type provides services.
    pub fn list_providers(&self, providers_only: bool) -> DbResult<Vec<Provider>> {
        let sql = if providers_only {
            r#"
            SELECT p.id, p.name, p.provider_type_id, p.resource_id, p.active
            FROM providers p
            JOIN provider_types t ON t.id = p.provider_type_id
            WHERE t.is_provider = 1
            ORDER BY p.name
            "#
        } else {
            r#"
            SELECT id, name, provider_type_id, resource_id, active
            FROM providers
            ORDER BY name
            "#
        };
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], provider_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Create missing resources for rooms and providers (e.g. after an import).
    pub fn ensure_linked_resources(&self) -> DbResult<BackfillReport> {
        self.with_savepoint("ensure_linked_resources", || {
            let mut report = BackfillReport::default();

            let rooms: Vec<Room> = self
                .list_rooms(false)?
                .into_iter()
                .filter(|room| room.resource_id.is_none())
                .collect();
            tracing::info!(count = rooms.len(), "Found rooms without resources");

            for mut room in rooms {
                let resource = Resource::new(room.name.clone(), ResourceKind::Material, room.active);
                self.insert_resource(&resource)?;
                room.resource_id = Some(resource.id);
                self.update_room(&room)?;
                tracing::info!(room = %room.name, "Created resource for room");
                report.rooms += 1;
            }

            let providers: Vec<Provider> = self
                .list_providers(true)?
                .into_iter()
                .filter(|provider| provider.resource_id.is_none())
                .collect();
            tracing::info!(count = providers.len(), "Found providers without resources");

            for mut provider in providers {
                self.ensure_provider_resource(&mut provider)?;
                report.providers += 1;
            }

            Ok(report)
        })
    }

    // =========================================================================
    // Species & Booking Types
    // =========================================================================

    /// Insert a species.
    pub fn insert_species(&self, species: &Species) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO species (id, name, code, description, active) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![species.id, species.name, species.code, species.description, species.active],
        )?;
        Ok(())
    }

    /// Get a species by ID.
    pub fn get_species(&self, id: &str) -> DbResult<Option<Species>> {
        self.conn
            .query_row(
                "SELECT id, name, code, description, active FROM species WHERE id = ?",
                [id],
                |row| {
                    Ok(Species {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        code: row.get(2)?,
                        description: row.get(3)?,
                        active: row.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// List active species by name.
    pub fn list_species(&self) -> DbResult<Vec<Species>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, code, description, active FROM species WHERE active = 1 ORDER BY name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Species {
                id: row.get(0)?,
                name: row.get(1)?,
                code: row.get(2)?,
                description: row.get(3)?,
                active: row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Insert a booking type.
    pub fn insert_booking_type(&self, booking_type: &BookingType) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO booking_types (id, name, duration_hours, active) VALUES (?1, ?2, ?3, ?4)",
            params![
                booking_type.id,
                booking_type.name,
                booking_type.duration_hours,
                booking_type.active,
            ],
        )?;
        Ok(())
    }

    /// Get a booking type by ID.
    pub fn get_booking_type(&self, id: &str) -> DbResult<Option<BookingType>> {
        self.conn
            .query_row(
                "SELECT id, name, duration_hours, active FROM booking_types WHERE id = ?",
                [id],
                |row| {
                    Ok(BookingType {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        duration_hours: row.get(2)?,
                        active: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }
}
