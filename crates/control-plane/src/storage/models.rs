// Database models (internal, may differ from public DTOs)

use cats_core::Cat;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CatRow {
    pub id: i64,
    pub name: String,
    pub age_years: i32,
    pub breed: Option<String>,
    pub coat_color: Option<String>,
    pub weight_kg: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateCatRow {
    pub name: String,
    pub age_years: i32,
    pub breed: Option<String>,
    pub coat_color: Option<String>,
    pub weight_kg: Option<f64>,
}

impl From<CatRow> for Cat {
    fn from(row: CatRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            age_years: row.age_years,
            breed: row.breed,
            coat_color: row.coat_color,
            weight_kg: row.weight_kg,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
