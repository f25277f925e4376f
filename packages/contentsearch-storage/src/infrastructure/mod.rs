//! Infrastructure layer - Storage adapters
//!
//! - memory: lock-guarded maps (tests, embedding)
//! - sqlite: file-backed store, one SQL transaction per commit

pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::{MemoryDocumentStore, MemoryItemSource};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDocumentStore;
