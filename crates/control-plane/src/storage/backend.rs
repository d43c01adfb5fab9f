// Storage backend abstraction
// Decision: Use enum dispatch for simplicity over trait objects
//
// This module provides a unified StorageBackend enum that can work with
// either PostgreSQL (production) or in-memory (dev mode) storage.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::memory::InMemoryDatabase;
use super::models::*;
use super::repositories::{Database, DatabaseOptions};

/// Storage backend that can be either PostgreSQL or in-memory
#[derive(Clone)]
pub enum StorageBackend {
    /// PostgreSQL database (production)
    Postgres(Database),
    /// In-memory database (dev mode)
    InMemory(Arc<InMemoryDatabase>),
}

impl StorageBackend {
    /// Connect to PostgreSQL and bring the schema up to date
    pub async fn postgres(database_url: &str, options: &DatabaseOptions) -> Result<Self> {
        let db = Database::connect(database_url, options).await?;
        db.migrate().await?;
        Ok(Self::Postgres(db))
    }

    /// Create an in-memory storage backend
    pub fn in_memory() -> Self {
        Self::InMemory(Arc::new(InMemoryDatabase::new()))
    }

    // ============================================
    // Cats
    // ============================================

    pub async fn create_cat(&self, input: CreateCatRow) -> Result<CatRow> {
        match self {
            Self::Postgres(db) => db.create_cat(input).await,
            Self::InMemory(db) => db.create_cat(input).await,
        }
    }

    pub async fn get_cat(&self, id: i64) -> Result<Option<CatRow>> {
        match self {
            Self::Postgres(db) => db.get_cat(id).await,
            Self::InMemory(db) => db.get_cat(id).await,
        }
    }

    pub async fn list_cats(
        &self,
        limit: i64,
        cursor: Option<DateTime<Utc>>,
    ) -> Result<Vec<CatRow>> {
        match self {
            Self::Postgres(db) => db.list_cats(limit, cursor).await,
            Self::InMemory(db) => db.list_cats(limit, cursor).await,
        }
    }
}
