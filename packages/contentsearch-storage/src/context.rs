//! Staged update contexts backed by a `DocumentStore`
//!
//! Crawlers record `DocumentOp`s on the context; nothing reaches the store
//! until `commit`, which hands the whole batch to `DocumentStore::apply`.

use contentsearch_maintenance::{
    ItemId, MaintenanceConfig, MaintenanceError, ParallelConfig, ParallelOptions, Result,
    UniqueItemId, UpdateContext, UpdateContextProvider,
};
use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

use crate::domain::{Document, DocumentOp, DocumentStore};

pub struct StagedUpdateContext {
    index_name: String,
    store: Arc<dyn DocumentStore>,
    parallel: ParallelConfig,
    ops: Mutex<Vec<DocumentOp>>,
}

impl StagedUpdateContext {
    pub fn new(
        index_name: impl Into<String>,
        store: Arc<dyn DocumentStore>,
        parallel: ParallelConfig,
    ) -> Self {
        Self {
            index_name: index_name.into(),
            store,
            parallel,
            ops: Mutex::new(Vec::new()),
        }
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn stage(&self, op: DocumentOp) {
        self.ops.lock().push(op);
    }

    pub fn upsert(&self, document: Document) {
        self.stage(DocumentOp::Upsert(document));
    }

    pub fn delete_item(&self, item: &ItemId) {
        self.stage(DocumentOp::DeleteItem(item.clone()));
    }

    pub fn delete_version(&self, id: &UniqueItemId) {
        self.stage(DocumentOp::DeleteVersion(id.clone()));
    }

    /// Number of ops waiting for commit
    pub fn staged_len(&self) -> usize {
        self.ops.lock().len()
    }
}

impl UpdateContext for StagedUpdateContext {
    fn is_parallel(&self) -> bool {
        self.parallel.enabled
    }

    fn parallel_options(&self) -> ParallelOptions {
        self.parallel.options()
    }

    fn commit(&self) -> Result<()> {
        let ops = std::mem::take(&mut *self.ops.lock());
        self.store
            .apply(&self.index_name, &ops)
            .map_err(|e| e.into_commit(&self.index_name))?;

        debug!(index = %self.index_name, ops = ops.len(), "Staged ops committed");
        Ok(())
    }

    fn discard(&self) {
        let dropped = std::mem::take(&mut *self.ops.lock()).len();
        debug!(index = %self.index_name, dropped, "Staged ops discarded");
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }
}

/// Opens a `StagedUpdateContext` per operation against one store
pub struct StoreContextProvider {
    store: Arc<dyn DocumentStore>,
    parallel: ParallelConfig,
}

impl StoreContextProvider {
    pub fn new(store: Arc<dyn DocumentStore>, parallel: ParallelConfig) -> Self {
        Self { store, parallel }
    }

    pub fn from_config(store: Arc<dyn DocumentStore>, config: &MaintenanceConfig) -> Self {
        Self::new(store, config.parallel)
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }
}

impl UpdateContextProvider for StoreContextProvider {
    fn create_update_context(&self, index_name: &str) -> Result<Box<dyn UpdateContext>> {
        self.store
            .check_ready(index_name)
            .map_err(MaintenanceError::context_creation)?;
        Ok(Box::new(StagedUpdateContext::new(
            index_name,
            self.store.clone(),
            self.parallel,
        )))
    }
}
