//! Room/provider resource combination resolution.

use crate::db::{Database, DbResult};
use crate::models::{Combination, Provider, Room};

/// Maps a (room, provider) pair to the combination of their linked resources.
pub struct CombinationResolver<'a> {
    db: &'a Database,
}

impl<'a> CombinationResolver<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Linked resource IDs of the room and provider, room first.
    pub fn member_resources(room: Option<&Room>, provider: Option<&Provider>) -> Vec<String> {
        room.and_then(|r| r.resource_id.clone())
            .into_iter()
            .chain(provider.and_then(|p| p.resource_id.clone()))
            .collect()
    }

    /// Find or create the combination for exactly these linked resources.
    ///
    /// Returns `None` when neither side has a linked resource.
    pub fn resolve_combination(
        &self,
        room: Option<&Room>,
        provider: Option<&Provider>,
    ) -> DbResult<Option<Combination>> {
        let members = Self::member_resources(room, provider);
        if members.is_empty() {
            return Ok(None);
        }
        self.db.find_or_create_combination(&members)
    }

    /// Like [`resolve_combination`](Self::resolve_combination) but never creates.
    pub fn lookup_combination(
        &self,
        room: Option<&Room>,
        provider: Option<&Provider>,
    ) -> DbResult<Option<Combination>> {
        let members = Self::member_resources(room, provider);
        self.db.find_combination_by_members(&members)
    }

    /// Resolve from stored room and provider IDs.
    pub fn resolve_for_ids(
        &self,
        room_id: Option<&str>,
        provider_id: Option<&str>,
    ) -> DbResult<Option<Combination>> {
        let room = match room_id {
            Some(id) => self.db.get_room(id)?,
            None => None,
        };
        let provider = match provider_id {
            Some(id) => self.db.get_provider(id)?,
            None => None,
        };
        self.resolve_combination(room.as_ref(), provider.as_ref())
    }
}
