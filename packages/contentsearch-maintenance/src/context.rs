//! Update contexts - one transactional unit of work against an index
//!
//! A context is opened per operation, mutated by crawlers and committed once.
//! `ContextScope` owns the context for the duration of the operation: `commit`
//! consumes the scope, and a scope dropped without committing (crawler error,
//! unwinding) discards the staged work instead.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::any::Any;
use tracing::{debug, warn};

/// Parallelism settings of a context
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelOptions {
    /// Upper bound on concurrent workers (None = one per CPU)
    pub max_degree_of_parallelism: Option<usize>,
}

impl ParallelOptions {
    pub fn with_max_degree(max: usize) -> Self {
        Self {
            max_degree_of_parallelism: Some(max),
        }
    }

    /// Effective worker count, never zero
    pub fn worker_count(&self) -> usize {
        self.max_degree_of_parallelism
            .unwrap_or_else(num_cpus::get)
            .max(1)
    }
}

/// Transactional unit of work handed to crawlers
///
/// Crawlers share one context across worker threads in a parallel batch,
/// so mutation goes through `&self`.
pub trait UpdateContext: Send + Sync {
    /// Whether batch updates on this context fan out across workers
    fn is_parallel(&self) -> bool;

    fn parallel_options(&self) -> ParallelOptions;

    /// Make the staged work durable. Called at most once per context.
    fn commit(&self) -> Result<()>;

    /// Release the context without committing
    fn discard(&self) {}

    /// Concrete context, for crawlers that stage through a known backend
    fn as_any(&self) -> Option<&dyn Any> {
        None
    }
}

/// Factory for update contexts
pub trait UpdateContextProvider: Send + Sync {
    fn create_update_context(&self, index_name: &str) -> Result<Box<dyn UpdateContext>>;
}

/// Scoped ownership of an open context
pub struct ContextScope {
    index_name: String,
    context: Box<dyn UpdateContext>,
    committed: bool,
}

impl ContextScope {
    pub fn open(provider: &dyn UpdateContextProvider, index_name: &str) -> Result<Self> {
        let context = provider.create_update_context(index_name)?;
        debug!(index = index_name, parallel = context.is_parallel(), "Opened update context");

        Ok(Self {
            index_name: index_name.to_string(),
            context,
            committed: false,
        })
    }

    pub fn context(&self) -> &dyn UpdateContext {
        self.context.as_ref()
    }

    pub fn is_parallel(&self) -> bool {
        self.context.is_parallel()
    }

    pub fn parallel_options(&self) -> ParallelOptions {
        self.context.parallel_options()
    }

    /// Commit and release the context
    ///
    /// A failed commit is not followed by a discard; the storage layer owns
    /// the state of a half-applied commit.
    pub fn commit(mut self) -> Result<()> {
        self.committed = true;
        self.context.commit()?;
        debug!(index = %self.index_name, "Committed update context");
        Ok(())
    }
}

impl Drop for ContextScope {
    fn drop(&mut self) {
        if !self.committed {
            warn!(index = %self.index_name, "Update context released without commit");
            self.context.discard();
        }
    }
}
