/*
 * Contentsearch Maintenance - Incremental Search Index Maintenance
 *
 * Applies item create/change/delete notifications to search indexes
 * while keeping index content consistent with the content source.
 *
 * Architecture:
 * - SearchIndex controller (delete / update / batch update / refresh)
 * - Gating (options + pause/resume/stop state)
 * - Scoped update contexts (open -> mutate -> commit exactly once)
 * - Pluggable crawlers (trait objects)
 * - Sequential or rayon fan-out for batch updates
 * - Indexing lifecycle notifications
 */

// Public modules
pub mod config;
pub mod context;
pub mod crawler;
pub mod error;
pub mod events;
pub mod gating;
pub mod identity;
pub mod index;
pub mod options;
pub mod telemetry;

// Re-exports
pub use config::{ConfigError, EventsConfig, MaintenanceConfig, ParallelConfig};
pub use context::{ContextScope, ParallelOptions, UpdateContext, UpdateContextProvider};
pub use crawler::{CrawlOperation, Crawler};
pub use error::{MaintenanceError, Result};
pub use events::{
    CompositeNotifier, EventNotifier, IndexingEvent, IndexingEventArgs, QueuedEvent,
    QueuedEventStore, TracingNotifier, INDEXING_END, INDEXING_START,
};
pub use gating::{GatingPolicy, IndexGate, IndexingState, IndexingStateHandle};
pub use identity::{DeleteTarget, IndexableItem, ItemId, UniqueItemId};
pub use index::{BatchOutcome, SearchIndex, SearchIndexBuilder};
pub use options::IndexingOptions;

// Cancellation token accepted by `SearchIndex::refresh_with_cancellation`
pub use tokio_util::sync::CancellationToken;
