// Thumbnail generation, the side effect queued after every cat insert
//
// Runs on the shared task pool, off the request path. Outcomes are only
// logged; a failed thumbnail never affects the stored record.

use anyhow::Result;
use async_trait::async_trait;
use cats_core::Cat;
use cats_worker::current_worker;
use tracing::info;

/// Produces the derived image asset for a cat record
#[async_trait]
pub trait ThumbnailGenerator: Send + Sync {
    async fn generate(&self, cat: &Cat) -> Result<()>;
}

/// Default generator: derives the asset key and records it in the log
#[derive(Debug, Default, Clone)]
pub struct TracingThumbnailGenerator;

impl TracingThumbnailGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ThumbnailGenerator for TracingThumbnailGenerator {
    async fn generate(&self, cat: &Cat) -> Result<()> {
        info!(
            cat_id = cat.id,
            key = %cat.thumbnail_key(),
            worker = ?current_worker(),
            "Generated thumbnail"
        );
        Ok(())
    }
}
