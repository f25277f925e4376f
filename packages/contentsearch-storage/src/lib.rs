//! Contentsearch Storage - document stores behind the maintenance core
//!
//! Plugs a concrete backend into `contentsearch-maintenance`:
//!
//! - `StoreContextProvider` opens a `StagedUpdateContext` per operation
//! - crawlers stage `DocumentOp`s on that context
//! - commit applies the staged batch to a `DocumentStore` in one step
//!
//! ## Backends
//!
//! - `MemoryDocumentStore`: lock-guarded map
//! - `SqliteDocumentStore`: feature `sqlite` (default), one transaction per commit
//!
//! ## Usage
//!
//! ```rust,ignore
//! use contentsearch_maintenance::{ParallelConfig, SearchIndex, UniqueItemId};
//! use contentsearch_storage::{MemoryDocumentStore, MemoryItemSource, SourceCrawler, StoreContextProvider};
//!
//! let store = Arc::new(MemoryDocumentStore::new());
//! let source = Arc::new(MemoryItemSource::new());
//!
//! let index = SearchIndex::builder(
//!     "pages",
//!     Arc::new(StoreContextProvider::new(store.clone(), ParallelConfig::default())),
//! )
//! .crawler(Arc::new(SourceCrawler::new("content", source)))
//! .build();
//!
//! index.update(&UniqueItemId::new("home", "1"))?;
//! ```

pub mod context;
pub mod crawler;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::{ErrorKind, Result, StorageError};

pub use context::{StagedUpdateContext, StoreContextProvider};
pub use crawler::SourceCrawler;
pub use domain::{Document, DocumentOp, DocumentStore, ItemSource, SourceItem};
pub use infrastructure::{MemoryDocumentStore, MemoryItemSource};

#[cfg(feature = "sqlite")]
pub use infrastructure::SqliteDocumentStore;
