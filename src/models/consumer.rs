use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::consumers;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = consumers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Consumer {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = consumers)]
pub struct NewConsumer {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
}
