//! Recording fakes shared by the integration tests
//!
//! Every collaborator writes into one `Journal` so tests can assert the exact
//! interleaving of context, crawler, commit and notification calls.

#![allow(dead_code)]

use contentsearch_maintenance::{
    telemetry, CancellationToken, CrawlOperation, Crawler, DeleteTarget, EventNotifier,
    IndexableItem, IndexingEvent, IndexingEventArgs, IndexingOptions, MaintenanceError,
    ParallelOptions, Result, SearchIndex, UniqueItemId, UpdateContext, UpdateContextProvider,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Opened,
    Delete { crawler: String, target: DeleteTarget },
    Update { crawler: String, id: UniqueItemId },
    Refresh { crawler: String, root: String },
    Commit,
    Discard,
    Signal(String),
    Queued(IndexingEvent),
}

#[derive(Default)]
pub struct Journal {
    entries: Mutex<Vec<Entry>>,
}

impl Journal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, entry: Entry) {
        self.entries.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.entries.lock().clone()
    }

    pub fn count(&self, pred: impl Fn(&Entry) -> bool) -> usize {
        self.entries.lock().iter().filter(|e| pred(e)).count()
    }

    pub fn commits(&self) -> usize {
        self.count(|e| matches!(e, Entry::Commit))
    }

    pub fn opened(&self) -> usize {
        self.count(|e| matches!(e, Entry::Opened))
    }

    pub fn discards(&self) -> usize {
        self.count(|e| matches!(e, Entry::Discard))
    }

    pub fn signals(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter_map(|e| match e {
                Entry::Signal(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn updates(&self) -> Vec<(String, UniqueItemId)> {
        self.entries
            .lock()
            .iter()
            .filter_map(|e| match e {
                Entry::Update { crawler, id } => Some((crawler.clone(), id.clone())),
                _ => None,
            })
            .collect()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Update context
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct RecordingContext {
    journal: Arc<Journal>,
    parallel: Option<ParallelOptions>,
    fail_commit: bool,
}

impl UpdateContext for RecordingContext {
    fn is_parallel(&self) -> bool {
        self.parallel.is_some()
    }

    fn parallel_options(&self) -> ParallelOptions {
        self.parallel.unwrap_or_default()
    }

    fn commit(&self) -> Result<()> {
        self.journal.push(Entry::Commit);
        if self.fail_commit {
            return Err(MaintenanceError::commit("recording", "commit refused"));
        }
        Ok(())
    }

    fn discard(&self) {
        self.journal.push(Entry::Discard);
    }
}

pub struct RecordingProvider {
    journal: Arc<Journal>,
    parallel: Option<ParallelOptions>,
    fail_commit: bool,
}

impl RecordingProvider {
    pub fn sequential(journal: &Arc<Journal>) -> Arc<Self> {
        Arc::new(Self {
            journal: journal.clone(),
            parallel: None,
            fail_commit: false,
        })
    }

    pub fn parallel(journal: &Arc<Journal>, workers: usize) -> Arc<Self> {
        Arc::new(Self {
            journal: journal.clone(),
            parallel: Some(ParallelOptions::with_max_degree(workers)),
            fail_commit: false,
        })
    }

    pub fn failing_commit(journal: &Arc<Journal>) -> Arc<Self> {
        Arc::new(Self {
            journal: journal.clone(),
            parallel: None,
            fail_commit: true,
        })
    }
}

impl UpdateContextProvider for RecordingProvider {
    fn create_update_context(&self, _index_name: &str) -> Result<Box<dyn UpdateContext>> {
        self.journal.push(Entry::Opened);
        Ok(Box::new(RecordingContext {
            journal: self.journal.clone(),
            parallel: self.parallel,
            fail_commit: self.fail_commit,
        }))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Crawler
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

type UpdateHook = Box<dyn Fn(&UniqueItemId) + Send + Sync>;
type RefreshHook = Box<dyn Fn(&CancellationToken) + Send + Sync>;

pub struct RecordingCrawler {
    name: String,
    journal: Arc<Journal>,
    pending: AtomicBool,
    fail_on: Option<UniqueItemId>,
    on_update: Option<UpdateHook>,
    on_refresh: Option<RefreshHook>,
    pub options_seen: Mutex<Vec<IndexingOptions>>,
    pub refresh_calls: AtomicUsize,
}

impl RecordingCrawler {
    pub fn new(name: &str, journal: &Arc<Journal>) -> Self {
        Self {
            name: name.to_string(),
            journal: journal.clone(),
            pending: AtomicBool::new(true),
            fail_on: None,
            on_update: None,
            on_refresh: None,
            options_seen: Mutex::new(Vec::new()),
            refresh_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_on(mut self, id: UniqueItemId) -> Self {
        self.fail_on = Some(id);
        self
    }

    pub fn with_pending(self, pending: bool) -> Self {
        self.pending.store(pending, Ordering::SeqCst);
        self
    }

    pub fn on_update(mut self, hook: impl Fn(&UniqueItemId) + Send + Sync + 'static) -> Self {
        self.on_update = Some(Box::new(hook));
        self
    }

    pub fn on_refresh(mut self, hook: impl Fn(&CancellationToken) + Send + Sync + 'static) -> Self {
        self.on_refresh = Some(Box::new(hook));
        self
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Crawler for RecordingCrawler {
    fn name(&self) -> &str {
        &self.name
    }

    fn delete(
        &self,
        _ctx: &dyn UpdateContext,
        target: &DeleteTarget,
        options: IndexingOptions,
    ) -> Result<()> {
        self.options_seen.lock().push(options);
        self.journal.push(Entry::Delete {
            crawler: self.name.clone(),
            target: target.clone(),
        });
        Ok(())
    }

    fn update(
        &self,
        _ctx: &dyn UpdateContext,
        id: &UniqueItemId,
        options: IndexingOptions,
    ) -> Result<()> {
        self.options_seen.lock().push(options);
        if self.fail_on.as_ref() == Some(id) {
            return Err(MaintenanceError::crawler(
                &self.name,
                CrawlOperation::Update,
                format!("cannot read {}", id),
            ));
        }
        self.journal.push(Entry::Update {
            crawler: self.name.clone(),
            id: id.clone(),
        });
        if let Some(hook) = &self.on_update {
            hook(id);
        }
        Ok(())
    }

    fn refresh_from_root(
        &self,
        _ctx: &dyn UpdateContext,
        root: &IndexableItem,
        options: IndexingOptions,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.options_seen.lock().push(options);
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = &self.on_refresh {
            hook(cancel);
        }
        self.journal.push(Entry::Refresh {
            crawler: self.name.clone(),
            root: root.path.clone(),
        });
        Ok(())
    }

    fn has_pending_items(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Notifier
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct RecordingNotifier {
    journal: Arc<Journal>,
}

impl RecordingNotifier {
    pub fn new(journal: &Arc<Journal>) -> Arc<Self> {
        Arc::new(Self {
            journal: journal.clone(),
        })
    }
}

impl EventNotifier for RecordingNotifier {
    fn raise_event(&self, name: &str, args: &IndexingEventArgs) {
        assert!(!args.full_rebuild);
        self.journal.push(Entry::Signal(name.to_string()));
    }

    fn queue_event(&self, event: IndexingEvent) {
        self.journal.push(Entry::Queued(event));
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Fixtures
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub fn uid(item: &str) -> UniqueItemId {
    UniqueItemId::new(item, "1")
}

pub fn uids(n: usize) -> Vec<UniqueItemId> {
    (0..n).map(|i| uid(&format!("item-{}", i))).collect()
}

pub fn root() -> IndexableItem {
    IndexableItem::new(uid("root"), "/content")
}

pub fn update(crawler: &str, id: &UniqueItemId) -> Entry {
    Entry::Update {
        crawler: crawler.to_string(),
        id: id.clone(),
    }
}

pub fn index_with(
    journal: &Arc<Journal>,
    provider: Arc<dyn UpdateContextProvider>,
    crawlers: Vec<Arc<dyn Crawler>>,
) -> SearchIndex {
    let _ = telemetry::init_test_tracing("contentsearch_maintenance=debug");
    SearchIndex::builder("test_index", provider)
        .folder("/indexes/test_index")
        .crawlers(crawlers)
        .notifier(RecordingNotifier::new(journal))
        .build()
}
