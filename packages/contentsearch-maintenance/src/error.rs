use crate::config::ConfigError;
use crate::crawler::CrawlOperation;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MaintenanceError>;

/// Boxed source error carried by crawler and commit failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum MaintenanceError {
    #[error("Index '{index}' has been disposed")]
    Disposed { index: String },

    #[error("Crawler '{crawler}' failed during {operation}: {source}")]
    Crawler {
        crawler: String,
        operation: CrawlOperation,
        #[source]
        source: BoxError,
    },

    #[error("Commit failed for index '{index}': {source}")]
    Commit {
        index: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to open update context: {0}")]
    ContextCreation(String),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MaintenanceError {
    pub fn disposed(index: impl Into<String>) -> Self {
        Self::Disposed {
            index: index.into(),
        }
    }

    pub fn crawler<E>(crawler: impl Into<String>, operation: CrawlOperation, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Crawler {
            crawler: crawler.into(),
            operation,
            source: source.into(),
        }
    }

    pub fn commit<E>(index: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Commit {
            index: index.into(),
            source: source.into(),
        }
    }

    pub fn context_creation<E: std::fmt::Display>(e: E) -> Self {
        Self::ContextCreation(e.to_string())
    }

    pub fn worker_pool<E: std::fmt::Display>(e: E) -> Self {
        Self::WorkerPool(e.to_string())
    }

    /// True for failures raised by the index lifecycle rather than by a collaborator
    pub fn is_disposed(&self) -> bool {
        matches!(self, Self::Disposed { .. })
    }
}
