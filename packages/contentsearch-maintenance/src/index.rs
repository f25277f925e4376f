//! Search index maintenance controller
//!
//! `SearchIndex` owns the registered crawlers and applies delete, update,
//! batch update and refresh requests to them through scoped update contexts:
//!
//! ```text
//! caller ─→ disposed? ─→ gate ─→ open context ─→ crawlers (seq | rayon) ─→ commit
//!                          │
//!                          └─ denied: Ok(()) with no context, no crawler, no event
//! ```
//!
//! Refresh is the only operation serialized by a lock. Deletes and updates
//! may run concurrently with each other and with a refresh.

use crate::context::{ContextScope, UpdateContext, UpdateContextProvider};
use crate::crawler::{CrawlOperation, Crawler};
use crate::error::{MaintenanceError, Result};
use crate::events::{
    EventNotifier, IndexingEvent, IndexingEventArgs, TracingNotifier, INDEXING_END,
    INDEXING_START,
};
use crate::gating::{GatingPolicy, IndexGate, IndexingStateHandle};
use crate::identity::{DeleteTarget, IndexableItem, ItemId, UniqueItemId};
use crate::options::IndexingOptions;
use dashmap::DashMap;
use parking_lot::Mutex;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Result of a batch update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// Gate denied the batch up front; nothing ran
    Skipped,
    /// Every identity was offered to the crawlers
    Completed { processed: usize },
    /// Gate closed mid-batch; work so far was committed, no finished event
    Interrupted { processed: usize },
}

impl BatchOutcome {
    pub fn processed(&self) -> usize {
        match self {
            BatchOutcome::Skipped => 0,
            BatchOutcome::Completed { processed } | BatchOutcome::Interrupted { processed } => {
                *processed
            }
        }
    }
}

/// Search index maintenance controller
pub struct SearchIndex {
    name: String,
    folder: PathBuf,
    crawlers: Vec<Arc<dyn Crawler>>,
    gate: Arc<dyn GatingPolicy>,
    provider: Arc<dyn UpdateContextProvider>,
    notifier: Arc<dyn EventNotifier>,
    refresh_lock: Mutex<()>,
    disposed: AtomicBool,
    /// Batch worker pools, keyed by worker count
    worker_pools: DashMap<usize, Arc<ThreadPool>>,
}

impl std::fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex")
            .field("name", &self.name)
            .field("folder", &self.folder)
            .field(
                "crawlers",
                &self.crawlers.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl SearchIndex {
    pub fn builder(
        name: impl Into<String>,
        provider: Arc<dyn UpdateContextProvider>,
    ) -> SearchIndexBuilder {
        SearchIndexBuilder::new(name, provider)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn crawlers(&self) -> &[Arc<dyn Crawler>] {
        &self.crawlers
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Dispose the index. Every later operation fails with `Disposed`.
    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            self.worker_pools.clear();
            info!(index = %self.name, "Index disposed");
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Delete
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    pub fn delete(&self, id: &ItemId) -> Result<()> {
        self.delete_with(id, IndexingOptions::Default)
    }

    pub fn delete_with(&self, id: &ItemId, options: IndexingOptions) -> Result<()> {
        self.perform_delete(&DeleteTarget::Item(id.clone()), options)
    }

    pub fn delete_version(&self, id: &UniqueItemId) -> Result<()> {
        self.delete_version_with(id, IndexingOptions::Default)
    }

    pub fn delete_version_with(&self, id: &UniqueItemId, options: IndexingOptions) -> Result<()> {
        self.perform_delete(&DeleteTarget::Version(id.clone()), options)
    }

    fn perform_delete(&self, target: &DeleteTarget, options: IndexingOptions) -> Result<()> {
        self.verify_not_disposed()?;
        if !self.should_start_indexing(options) {
            debug!(index = %self.name, target = %target, "Delete skipped by gate");
            return Ok(());
        }

        let scope = self.open_context()?;
        for crawler in &self.crawlers {
            crawler
                .delete(scope.context(), target, options)
                .map_err(|e| self.crawler_failed(crawler.as_ref(), CrawlOperation::Delete, e))?;
        }
        scope.commit()?;

        debug!(index = %self.name, target = %target, "Deleted");
        Ok(())
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Update (single item)
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    pub fn update(&self, id: &UniqueItemId) -> Result<()> {
        self.update_with(id, IndexingOptions::Default)
    }

    pub fn update_with(&self, id: &UniqueItemId, options: IndexingOptions) -> Result<()> {
        self.verify_not_disposed()?;
        if !self.should_start_indexing(options) {
            debug!(index = %self.name, id = %id, "Update skipped by gate");
            return Ok(());
        }

        let scope = self.open_context()?;
        self.apply_update(scope.context(), id, options)?;
        scope.commit()?;

        debug!(index = %self.name, id = %id, "Updated");
        Ok(())
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Update (batch)
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    pub fn update_batch(&self, ids: &[UniqueItemId]) -> Result<BatchOutcome> {
        self.update_batch_with(ids, IndexingOptions::Default)
    }

    /// Apply a batch of updates inside one context
    ///
    /// Announces `indexing:start` before any work and `indexing:end` after the
    /// commit. If the gate closes mid-batch the work done so far is committed
    /// and `indexing:end` is not announced.
    pub fn update_batch_with(
        &self,
        ids: &[UniqueItemId],
        options: IndexingOptions,
    ) -> Result<BatchOutcome> {
        self.verify_not_disposed()?;
        if !self.should_start_indexing(options) {
            debug!(index = %self.name, count = ids.len(), "Batch update skipped by gate");
            return Ok(BatchOutcome::Skipped);
        }

        let start = Instant::now();
        self.announce(IndexingEvent::started(&self.name, false));

        let scope = self.open_context()?;
        let outcome = if scope.is_parallel() {
            self.update_parallel(&scope, ids, options)?
        } else {
            self.update_sequential(&scope, ids, options)?
        };
        scope.commit()?;

        match outcome {
            BatchOutcome::Interrupted { processed } => {
                warn!(
                    index = %self.name,
                    processed,
                    total = ids.len(),
                    "Batch update interrupted by gate, partial work committed"
                );
            }
            _ => {
                info!(
                    index = %self.name,
                    processed = outcome.processed(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Batch update completed"
                );
                self.announce(IndexingEvent::finished(&self.name, false));
            }
        }

        Ok(outcome)
    }

    /// Input order, stop at the first gate denial
    fn update_sequential(
        &self,
        scope: &ContextScope,
        ids: &[UniqueItemId],
        options: IndexingOptions,
    ) -> Result<BatchOutcome> {
        let mut processed = 0;
        for id in ids {
            if !self.index_identity(scope.context(), id, options)? {
                return Ok(BatchOutcome::Interrupted { processed });
            }
            processed += 1;
        }
        Ok(BatchOutcome::Completed { processed })
    }

    /// Fan out across a worker pool sized by the context's parallel options
    fn update_parallel(
        &self,
        scope: &ContextScope,
        ids: &[UniqueItemId],
        options: IndexingOptions,
    ) -> Result<BatchOutcome> {
        let workers = scope.parallel_options().worker_count();
        let pool = self.worker_pool(workers)?;
        let processed = AtomicUsize::new(0);
        let ctx = scope.context();

        debug!(index = %self.name, workers, count = ids.len(), "Parallel batch update");

        pool.install(|| {
            ids.par_iter().try_for_each(|id| {
                if self.index_identity(ctx, id, options)? {
                    processed.fetch_add(1, Ordering::Relaxed);
                }
                Ok::<(), MaintenanceError>(())
            })
        })?;

        let processed = processed.into_inner();
        if self.should_start_indexing(options) {
            Ok(BatchOutcome::Completed { processed })
        } else {
            Ok(BatchOutcome::Interrupted { processed })
        }
    }

    /// Per-identity unit of work shared by both batch paths.
    /// Returns false (and does nothing) when the gate is closed.
    fn index_identity(
        &self,
        ctx: &dyn UpdateContext,
        id: &UniqueItemId,
        options: IndexingOptions,
    ) -> Result<bool> {
        if !self.should_start_indexing(options) {
            return Ok(false);
        }
        self.apply_update(ctx, id, options)?;
        Ok(true)
    }

    fn apply_update(
        &self,
        ctx: &dyn UpdateContext,
        id: &UniqueItemId,
        options: IndexingOptions,
    ) -> Result<()> {
        for crawler in &self.crawlers {
            crawler
                .update(ctx, id, options)
                .map_err(|e| self.crawler_failed(crawler.as_ref(), CrawlOperation::Update, e))?;
        }
        Ok(())
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Refresh
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    pub fn refresh(&self, root: &IndexableItem) -> Result<()> {
        self.refresh_with(root, IndexingOptions::Default)
    }

    pub fn refresh_with(&self, root: &IndexableItem, options: IndexingOptions) -> Result<()> {
        self.refresh_with_cancellation(root, options, &CancellationToken::new())
    }

    /// Re-crawl from `root` while holding the index's refresh lock
    ///
    /// The token is handed to the crawlers; the controller itself does not
    /// poll it between crawlers.
    pub fn refresh_with_cancellation(
        &self,
        root: &IndexableItem,
        options: IndexingOptions,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.verify_not_disposed()?;
        if !self.should_start_indexing(options) {
            debug!(index = %self.name, root = %root.path, "Refresh skipped by gate");
            return Ok(());
        }

        let _guard = self.refresh_lock.lock();

        if !self.crawlers.iter().any(|c| c.has_pending_items()) {
            debug!(index = %self.name, root = %root.path, "Refresh skipped, nothing pending");
            return Ok(());
        }

        let start = Instant::now();
        let scope = self.open_context()?;
        for crawler in &self.crawlers {
            crawler
                .refresh_from_root(scope.context(), root, options, cancel)
                .map_err(|e| {
                    self.crawler_failed(crawler.as_ref(), CrawlOperation::RefreshFromRoot, e)
                })?;
        }
        scope.commit()?;

        info!(
            index = %self.name,
            root = %root.path,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Refresh completed"
        );
        Ok(())
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Helpers
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    fn verify_not_disposed(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(MaintenanceError::disposed(&self.name));
        }
        Ok(())
    }

    fn should_start_indexing(&self, options: IndexingOptions) -> bool {
        self.gate.should_proceed(options)
    }

    fn open_context(&self) -> Result<ContextScope> {
        ContextScope::open(self.provider.as_ref(), &self.name)
    }

    /// Signal first, then the durable event
    fn announce(&self, event: IndexingEvent) {
        let args = IndexingEventArgs {
            index_name: self.name.clone(),
            full_rebuild: false,
        };
        self.notifier.raise_event(event.signal_name(), &args);
        self.notifier.queue_event(event);
    }

    fn crawler_failed(
        &self,
        crawler: &dyn Crawler,
        operation: CrawlOperation,
        err: MaintenanceError,
    ) -> MaintenanceError {
        error!(
            index = %self.name,
            crawler = crawler.name(),
            operation = %operation,
            error = %err,
            "Crawler failed"
        );
        err
    }

    fn worker_pool(&self, workers: usize) -> Result<Arc<ThreadPool>> {
        if let Some(pool) = self.worker_pools.get(&workers) {
            return Ok(pool.value().clone());
        }

        let prefix = self.name.clone();
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(move |i| format!("{}-indexer-{}", prefix, i))
            .build()
            .map_err(MaintenanceError::worker_pool)?;

        Ok(self
            .worker_pools
            .entry(workers)
            .or_insert_with(|| Arc::new(pool))
            .value()
            .clone())
    }
}

/// Builder for `SearchIndex`
pub struct SearchIndexBuilder {
    name: String,
    folder: PathBuf,
    crawlers: Vec<Arc<dyn Crawler>>,
    gate: Arc<dyn GatingPolicy>,
    provider: Arc<dyn UpdateContextProvider>,
    notifier: Arc<dyn EventNotifier>,
}

impl SearchIndexBuilder {
    pub fn new(name: impl Into<String>, provider: Arc<dyn UpdateContextProvider>) -> Self {
        Self {
            name: name.into(),
            folder: PathBuf::new(),
            crawlers: Vec::new(),
            gate: Arc::new(IndexGate::default()),
            provider,
            notifier: Arc::new(TracingNotifier),
        }
    }

    pub fn folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.folder = folder.into();
        self
    }

    pub fn crawler(mut self, crawler: Arc<dyn Crawler>) -> Self {
        self.crawlers.push(crawler);
        self
    }

    pub fn crawlers(mut self, crawlers: impl IntoIterator<Item = Arc<dyn Crawler>>) -> Self {
        self.crawlers.extend(crawlers);
        self
    }

    pub fn gate(mut self, gate: Arc<dyn GatingPolicy>) -> Self {
        self.gate = gate;
        self
    }

    /// Use the default gate over a shared enablement state
    pub fn state(self, state: IndexingStateHandle) -> Self {
        self.gate(Arc::new(IndexGate::new(state)))
    }

    pub fn notifier(mut self, notifier: Arc<dyn EventNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn build(self) -> SearchIndex {
        info!(
            index = %self.name,
            folder = %self.folder.display(),
            crawlers = self.crawlers.len(),
            "Search index created"
        );

        SearchIndex {
            name: self.name,
            folder: self.folder,
            crawlers: self.crawlers,
            gate: self.gate,
            provider: self.provider,
            notifier: self.notifier,
            refresh_lock: Mutex::new(()),
            disposed: AtomicBool::new(false),
            worker_pools: DashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ParallelOptions;

    struct NullContext;

    impl UpdateContext for NullContext {
        fn is_parallel(&self) -> bool {
            false
        }

        fn parallel_options(&self) -> ParallelOptions {
            ParallelOptions::default()
        }

        fn commit(&self) -> Result<()> {
            Ok(())
        }
    }

    struct NullProvider;

    impl UpdateContextProvider for NullProvider {
        fn create_update_context(&self, _index_name: &str) -> Result<Box<dyn UpdateContext>> {
            Ok(Box::new(NullContext))
        }
    }

    fn index() -> SearchIndex {
        SearchIndex::builder("unit", Arc::new(NullProvider))
            .folder("/tmp/unit")
            .build()
    }

    #[test]
    fn test_builder_defaults() {
        let index = index();
        assert_eq!(index.name(), "unit");
        assert_eq!(index.folder(), Path::new("/tmp/unit"));
        assert!(index.crawlers().is_empty());
        assert!(!index.is_disposed());
    }

    #[test]
    fn test_operations_fail_after_dispose() {
        let index = index();
        index.dispose();
        index.dispose();

        let uid = UniqueItemId::new("home", "1");
        let root = IndexableItem::new(uid.clone(), "/content/home");

        assert!(index.delete(&ItemId::new("home")).unwrap_err().is_disposed());
        assert!(index.delete_version(&uid).unwrap_err().is_disposed());
        assert!(index.update(&uid).unwrap_err().is_disposed());
        assert!(index.update_batch(&[uid]).unwrap_err().is_disposed());
        assert!(index.refresh(&root).unwrap_err().is_disposed());
    }

    #[test]
    fn test_empty_batch_completes() {
        let outcome = index().update_batch(&[]).unwrap();
        assert_eq!(outcome, BatchOutcome::Completed { processed: 0 });
    }

    #[test]
    fn test_worker_pool_is_cached() {
        let index = index();
        let first = index.worker_pool(2).unwrap();
        let second = index.worker_pool(2).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.current_num_threads(), 2);
    }

    #[test]
    fn test_batch_outcome_processed() {
        assert_eq!(BatchOutcome::Skipped.processed(), 0);
        assert_eq!(BatchOutcome::Completed { processed: 3 }.processed(), 3);
        assert_eq!(BatchOutcome::Interrupted { processed: 1 }.processed(), 1);
    }
}
