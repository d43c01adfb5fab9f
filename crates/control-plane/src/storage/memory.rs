// In-memory storage implementation for dev mode
// Decision: Use parking_lot for thread-safe access
// Decision: Sequential i64 ids, mirroring BIGSERIAL
//
// This implementation provides a PostgreSQL-compatible API backed by an
// in-memory BTreeMap, allowing the API to run without a database for
// development and tests.

use anyhow::Result;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::models::*;

#[derive(Default)]
struct CatTable {
    rows: BTreeMap<i64, CatRow>,
    last_id: i64,
    last_created_at: Option<DateTime<Utc>>,
}

/// In-memory database for dev mode
/// All data is stored in memory and lost on restart
#[derive(Default)]
pub struct InMemoryDatabase {
    cats: RwLock<CatTable>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    // Postgres stores microseconds, so round-tripped cursors must compare equal
    fn now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }

    // ============================================
    // Cats
    // ============================================

    pub async fn create_cat(&self, input: CreateCatRow) -> Result<CatRow> {
        let mut table = self.cats.write();

        // Strictly increasing so id order and created_at order agree
        let mut now = Self::now();
        if let Some(last) = table.last_created_at {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }

        table.last_id += 1;
        let row = CatRow {
            id: table.last_id,
            name: input.name,
            age_years: input.age_years,
            breed: input.breed,
            coat_color: input.coat_color,
            weight_kg: input.weight_kg,
            created_at: now,
            updated_at: now,
        };
        table.last_created_at = Some(now);
        table.rows.insert(row.id, row.clone());
        Ok(row)
    }

    pub async fn get_cat(&self, id: i64) -> Result<Option<CatRow>> {
        Ok(self.cats.read().rows.get(&id).cloned())
    }

    pub async fn list_cats(
        &self,
        limit: i64,
        cursor: Option<DateTime<Utc>>,
    ) -> Result<Vec<CatRow>> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .cats
            .read()
            .rows
            .values()
            .rev()
            .filter(|c| cursor.map_or(true, |cursor| c.created_at < cursor))
            .take(limit)
            .cloned()
            .collect())
    }
}
