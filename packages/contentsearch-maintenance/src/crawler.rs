use crate::context::UpdateContext;
use crate::error::Result;
use crate::identity::{DeleteTarget, IndexableItem, UniqueItemId};
use crate::options::IndexingOptions;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Crawler operation (used in error reporting)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlOperation {
    Delete,
    Update,
    RefreshFromRoot,
}

impl CrawlOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrawlOperation::Delete => "delete",
            CrawlOperation::Update => "update",
            CrawlOperation::RefreshFromRoot => "refresh_from_root",
        }
    }
}

impl std::fmt::Display for CrawlOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Crawler trait (pluggable index writers)
///
/// A crawler translates one item identity into index mutations staged on the
/// context it is given. It holds no controller state; the same instance is
/// called concurrently from batch workers.
pub trait Crawler: Send + Sync {
    /// Crawler name (logging and error reporting)
    fn name(&self) -> &str;

    fn delete(
        &self,
        ctx: &dyn UpdateContext,
        target: &DeleteTarget,
        options: IndexingOptions,
    ) -> Result<()>;

    fn update(
        &self,
        ctx: &dyn UpdateContext,
        id: &UniqueItemId,
        options: IndexingOptions,
    ) -> Result<()>;

    /// Re-crawl the tree below `root`. Implementations poll `cancel` themselves
    /// and return an error when they stop early, so the refresh is not committed.
    fn refresh_from_root(
        &self,
        ctx: &dyn UpdateContext,
        root: &IndexableItem,
        options: IndexingOptions,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Does this crawler have anything to index? Checked before a refresh.
    fn has_pending_items(&self) -> bool {
        true
    }
}
