//! Pet owner models.

use serde::{Deserialize, Serialize};

/// A pet owner (client) record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Owner {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub street: Option<String>,
    pub street2: Option<String>,
    pub city: Option<String>,
    /// State/province
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub notes: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Owner {
    /// Create a new owner with required fields.
    pub fn new(name: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            email: None,
            phone: None,
            mobile: None,
            street: None,
            street2: None,
            city: None,
            state: None,
            zip: None,
            country: None,
            notes: None,
            active: true,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Best contact number: mobile first, then phone.
    pub fn contact_number(&self) -> Option<&str> {
        self.mobile.as_deref().or(self.phone.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_owner() {
        let owner = Owner::new("John Doe".into());
        assert_eq!(owner.name, "John Doe");
        assert!(owner.active);
        assert_eq!(owner.id.len(), 36);
    }

    #[test]
    fn test_contact_number_prefers_mobile() {
        let mut owner = Owner::new("John Doe".into());
        assert_eq!(owner.contact_number(), None);

        owner.phone = Some("+1234567890".into());
        assert_eq!(owner.contact_number(), Some("+1234567890"));

        owner.mobile = Some("+1987654321".into());
        assert_eq!(owner.contact_number(), Some("+1987654321"));
    }
}
