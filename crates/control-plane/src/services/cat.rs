// Cat service for business logic
// Decision: Storage calls share one per-request deadline; thumbnail work goes to the task pool

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use cats_core::Cat;
use cats_worker::{PoolError, TaskPool};
use chrono::{DateTime, Utc};
use tracing::{debug, warn, Instrument};

use super::thumbnail::ThumbnailGenerator;
use crate::api::cats::CreateCatRequest;
use crate::storage::{CreateCatRow, StorageBackend};

/// One page of the newest-first cat listing
#[derive(Debug, Clone)]
pub struct CatPage {
    pub items: Vec<Cat>,
    /// Pass back as `cursor` to fetch the next (older) page
    pub next_cursor: Option<DateTime<Utc>>,
}

pub struct CatService {
    db: StorageBackend,
    pool: Arc<TaskPool>,
    thumbnails: Arc<dyn ThumbnailGenerator>,
    request_timeout: Duration,
}

impl CatService {
    pub fn new(
        db: StorageBackend,
        pool: Arc<TaskPool>,
        thumbnails: Arc<dyn ThumbnailGenerator>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            db,
            pool,
            thumbnails,
            request_timeout,
        }
    }

    async fn with_deadline<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout(self.request_timeout, fut)
            .await
            .with_context(|| {
                format!("{operation} timed out after {:?}", self.request_timeout)
            })?
            .with_context(|| format!("{operation} failed"))
    }

    pub async fn create(&self, req: CreateCatRequest) -> Result<Cat> {
        let span = tracing::info_span!("create_cat", cat.name = %req.name, cat.id = tracing::field::Empty);
        self.create_inner(req).instrument(span).await
    }

    async fn create_inner(&self, req: CreateCatRequest) -> Result<Cat> {
        let input = CreateCatRow {
            name: req.name,
            age_years: req.age_years,
            breed: req.breed,
            coat_color: req.coat_color,
            weight_kg: req.weight_kg,
        };
        let row = self
            .with_deadline("insert cat", self.db.create_cat(input))
            .await?;
        let cat = Cat::from(row);
        tracing::Span::current().record("cat.id", cat.id);

        self.queue_thumbnail(&cat).await;

        Ok(cat)
    }

    // The record is already stored; a closed pool only costs the thumbnail
    async fn queue_thumbnail(&self, cat: &Cat) {
        let generator = Arc::clone(&self.thumbnails);
        let subject = cat.clone();
        let result = self
            .pool
            .submit(move || async move { generator.generate(&subject).await })
            .await;

        match result {
            Ok(()) => debug!(cat_id = cat.id, "Thumbnail task queued"),
            Err(PoolError::Closed) => {
                warn!(cat_id = cat.id, "Task pool closed, skipping thumbnail")
            }
        }
    }

    pub async fn get(&self, id: i64) -> Result<Option<Cat>> {
        let row = self.with_deadline("get cat", self.db.get_cat(id)).await?;
        Ok(row.map(Cat::from))
    }

    pub async fn list(&self, limit: i64, cursor: Option<DateTime<Utc>>) -> Result<CatPage> {
        let rows = self
            .with_deadline("list cats", self.db.list_cats(limit, cursor))
            .await?;

        let items: Vec<Cat> = rows.into_iter().map(Cat::from).collect();
        let next_cursor = items.last().map(|c| c.created_at);

        Ok(CatPage { items, next_cursor })
    }
}
