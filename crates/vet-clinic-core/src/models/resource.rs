//! Bookable resources: rooms, providers and the combinations built from them.

use serde::{Deserialize, Serialize};

/// Kind of bookable resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// A physical place or piece of equipment (rooms)
    Material,
    /// A staff member (providers)
    User,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Material => "material",
            ResourceKind::User => "user",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "material" => Some(ResourceKind::Material),
            "user" => Some(ResourceKind::User),
            _ => None,
        }
    }
}

/// Generic bookable identity behind a room or a provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    pub id: String,
    pub name: String,
    pub kind: ResourceKind,
    pub active: bool,
}

impl Resource {
    pub fn new(name: String, kind: ResourceKind, active: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            kind,
            active,
        }
    }
}

/// An exam room, surgery suite, etc.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Room {
    pub id: String,
    /// Room name (unique)
    pub name: String,
    /// Display ordering
    pub sequence: i64,
    pub active: bool,
    pub description: Option<String>,
    /// Linked material resource, created alongside the room
    pub resource_id: Option<String>,
}

impl Room {
    pub fn new(name: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            sequence: 10,
            active: true,
            description: None,
            resource_id: None,
        }
    }
}

/// Staff role (Doctor, Tech, Groomer, Receptionist, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderType {
    pub id: String,
    /// Type name (unique)
    pub name: String,
    pub sequence: i64,
    /// Whether staff of this type provide services to patients
    pub is_provider: bool,
    pub active: bool,
    pub description: Option<String>,
}

impl ProviderType {
    pub fn new(name: String, is_provider: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            sequence: 10,
            is_provider,
            active: true,
            description: None,
        }
    }
}

/// A staff member who may be assigned to appointments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub provider_type_id: Option<String>,
    /// Linked user resource, present while the staff member is a provider
    pub resource_id: Option<String>,
    pub active: bool,
}

impl Provider {
    pub fn new(name: String, provider_type_id: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            provider_type_id,
            resource_id: None,
            active: true,
        }
    }
}

/// Animal species.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Species {
    pub id: String,
    pub name: String,
    /// Short code, at most 10 characters (e.g. "DOG")
    pub code: Option<String>,
    pub description: Option<String>,
    pub active: bool,
}

impl Species {
    pub fn new(name: String, code: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            code,
            description: None,
            active: true,
        }
    }
}

/// A jointly bookable set of resources, e.g. {Room 3, Dr. Smith}.
///
/// Identity is the exact set of member resource IDs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Combination {
    pub id: String,
    /// Member resource names joined with " + "
    pub name: String,
    /// Sorted, de-duplicated member resource IDs
    pub resource_ids: Vec<String>,
}

/// A bookable appointment type (e.g. "Dental Cleaning").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingType {
    pub id: String,
    pub name: String,
    /// Default duration in hours for bookings of this type
    pub duration_hours: f64,
    pub active: bool,
}

impl BookingType {
    pub fn new(name: String, duration_hours: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            duration_hours,
            active: true,
        }
    }
}

/// Makes a combination selectable for bookings of a type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypeCombinationLink {
    pub type_id: String,
    pub combination_id: String,
    pub sequence: i64,
}
