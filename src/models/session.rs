use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::sessions;

/// One row per issued session token. The consumer and producer tracks are
/// independent: both may be set at once, and logout clears only its own.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = sessions)]
#[diesel(primary_key(token))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Session {
    pub token: Uuid,
    pub consumer_id: Option<Uuid>,
    pub producer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = sessions)]
pub struct NewSession {
    pub token: Uuid,
    pub consumer_id: Option<Uuid>,
    pub producer_id: Option<Uuid>,
}
