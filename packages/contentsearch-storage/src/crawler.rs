//! Crawler that reads an `ItemSource` and stages documents
//!
//! Works only against `StagedUpdateContext`; any other context is reported
//! as a staging failure of the calling operation. A cancelled refresh fails
//! with a `cancelled` error so the controller discards what was staged.

use contentsearch_maintenance::{
    CancellationToken, CrawlOperation, Crawler, DeleteTarget, IndexableItem, IndexingOptions,
    Result, UniqueItemId, UpdateContext,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::context::StagedUpdateContext;
use crate::domain::ItemSource;
use crate::StorageError;

pub struct SourceCrawler {
    name: String,
    source: Arc<dyn ItemSource>,
}

impl SourceCrawler {
    pub fn new(name: impl Into<String>, source: Arc<dyn ItemSource>) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }

    fn staged<'a>(
        &self,
        ctx: &'a dyn UpdateContext,
        operation: CrawlOperation,
    ) -> Result<&'a StagedUpdateContext> {
        ctx.as_any()
            .and_then(|any| any.downcast_ref::<StagedUpdateContext>())
            .ok_or_else(|| {
                StorageError::staging("update context does not stage documents")
                    .into_crawler(&self.name, operation)
            })
    }
}

impl Crawler for SourceCrawler {
    fn name(&self) -> &str {
        &self.name
    }

    fn delete(
        &self,
        ctx: &dyn UpdateContext,
        target: &DeleteTarget,
        _options: IndexingOptions,
    ) -> Result<()> {
        let staged = self.staged(ctx, CrawlOperation::Delete)?;
        match target {
            DeleteTarget::Item(item) => staged.delete_item(item),
            DeleteTarget::Version(id) => staged.delete_version(id),
        }
        Ok(())
    }

    fn update(
        &self,
        ctx: &dyn UpdateContext,
        id: &UniqueItemId,
        _options: IndexingOptions,
    ) -> Result<()> {
        let staged = self.staged(ctx, CrawlOperation::Update)?;
        let item = self
            .source
            .item(id)
            .map_err(|e| e.into_crawler(&self.name, CrawlOperation::Update))?;

        match item {
            Some(item) => staged.upsert(item.to_document()),
            None => {
                // Gone from the source: drop the stale version
                debug!(crawler = %self.name, item = %id, "Item missing from source");
                staged.delete_version(id);
            }
        }
        Ok(())
    }

    fn refresh_from_root(
        &self,
        ctx: &dyn UpdateContext,
        root: &IndexableItem,
        _options: IndexingOptions,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let op = CrawlOperation::RefreshFromRoot;
        let staged = self.staged(ctx, op)?;

        let mut items = Vec::new();
        if let Some(item) = self
            .source
            .item(&root.unique_id)
            .map_err(|e| e.into_crawler(&self.name, op))?
        {
            items.push(item);
        }
        items.extend(
            self.source
                .descendants(root)
                .map_err(|e| e.into_crawler(&self.name, op))?,
        );

        let mut staged_count = 0usize;
        for item in &items {
            if cancel.is_cancelled() {
                info!(
                    crawler = %self.name,
                    root = %root.path,
                    staged = staged_count,
                    "Refresh cancelled"
                );
                let err = StorageError::cancelled(format!("refresh of {} cancelled", root.path));
                return Err(err.into_crawler(&self.name, op));
            }
            staged.upsert(item.to_document());
            staged_count += 1;
        }

        debug!(crawler = %self.name, root = %root.path, staged = staged_count, "Refresh staged");
        Ok(())
    }

    fn has_pending_items(&self) -> bool {
        self.source.has_pending_items()
    }
}
