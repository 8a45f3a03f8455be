use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::producers;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = producers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Producer {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub video_link: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = producers)]
pub struct NewProducer {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
}

/// Changeset for the profile edit form. `None` fields are left untouched.
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = producers)]
pub struct ProducerProfileChangeset {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub video_link: Option<String>,
}

impl ProducerProfileChangeset {
    /// Diesel rejects an UPDATE with no assignments, so callers skip the
    /// statement entirely for an all-`None` changeset.
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.bio.is_none()
            && self.profile_image.is_none()
            && self.video_link.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_changeset_is_empty() {
        assert!(ProducerProfileChangeset::default().is_empty());
    }

    #[test]
    fn any_field_makes_it_non_empty() {
        let changeset = ProducerProfileChangeset {
            bio: Some("maker of things".to_string()),
            ..Default::default()
        };
        assert!(!changeset.is_empty());
    }
}
