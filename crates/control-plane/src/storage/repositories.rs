// Repository layer for database operations
// Decision: Plain runtime-checked queries (query_as) so builds never need a live database

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::models::*;

const CAT_COLUMNS: &str =
    "id, name, age_years, breed, coat_color, weight_kg, created_at, updated_at";

/// Connection pool sizing
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub max_connections: u32,
    pub min_connections: u32,
    pub idle_timeout: Duration,
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Open a sized connection pool
    pub async fn connect(database_url: &str, options: &DatabaseOptions) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .min_connections(options.min_connections.min(options.max_connections))
            .idle_timeout(Some(options.idle_timeout))
            .connect(database_url)
            .await
            .context("Failed to connect to Postgres")?;
        Ok(Self { pool })
    }

    /// Apply embedded schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    // ============================================
    // Cats
    // ============================================

    pub async fn create_cat(&self, input: CreateCatRow) -> Result<CatRow> {
        let row = sqlx::query_as::<_, CatRow>(&format!(
            r#"
            INSERT INTO cats (name, age_years, breed, coat_color, weight_kg)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CAT_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(input.age_years)
        .bind(&input.breed)
        .bind(&input.coat_color)
        .bind(input.weight_kg)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_cat(&self, id: i64) -> Result<Option<CatRow>> {
        let row = sqlx::query_as::<_, CatRow>(&format!(
            "SELECT {CAT_COLUMNS} FROM cats WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Newest first; with a cursor, only rows strictly older than it
    pub async fn list_cats(
        &self,
        limit: i64,
        cursor: Option<DateTime<Utc>>,
    ) -> Result<Vec<CatRow>> {
        let rows = match cursor {
            Some(cursor) => {
                sqlx::query_as::<_, CatRow>(&format!(
                    r#"
                    SELECT {CAT_COLUMNS} FROM cats
                    WHERE created_at < $1
                    ORDER BY created_at DESC, id DESC
                    LIMIT $2
                    "#
                ))
                .bind(cursor)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, CatRow>(&format!(
                    r#"
                    SELECT {CAT_COLUMNS} FROM cats
                    ORDER BY created_at DESC, id DESC
                    LIMIT $1
                    "#
                ))
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows)
    }
}
