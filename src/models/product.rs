use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::products;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = products)]
#[diesel(belongs_to(crate::models::producer::Producer))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Product {
    pub id: Uuid,
    pub producer_id: Uuid,
    pub name: String,
    /// Price in the smallest currency unit, always >= 0.
    pub price: i64,
    pub description: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProduct {
    pub id: Uuid,
    pub producer_id: Uuid,
    pub name: String,
    pub price: i64,
    pub description: String,
    pub image: Option<String>,
}
