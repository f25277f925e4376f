//! Domain layer for document storage
//!
//! # Domain Models
//!
//! - `Document`: one indexed version of a content item
//! - `DocumentOp`: a mutation staged on an update context
//! - `SourceItem`: an item as the content source reports it
//!
//! # Port Traits
//!
//! - `DocumentStore`: where committed documents live
//! - `ItemSource`: where crawlers read content from
//!
//! # Examples
//!
//! ```rust
//! use contentsearch_storage::domain::{Document, DocumentOp, DocumentStore};
//! use contentsearch_storage::MemoryDocumentStore;
//! use contentsearch_maintenance::UniqueItemId;
//!
//! let store = MemoryDocumentStore::new();
//! let doc = Document::new(UniqueItemId::new("home", "1"), "/content/home", "Welcome");
//! store.apply("pages", &[DocumentOp::Upsert(doc)]).unwrap();
//! assert_eq!(store.count("pages").unwrap(), 1);
//! ```

use chrono::{DateTime, Utc};
use contentsearch_maintenance::{IndexableItem, ItemId, UniqueItemId};
use serde::{Deserialize, Serialize};

use crate::Result;

// ═══════════════════════════════════════════════════════════════════════════
// Domain Models
// ═══════════════════════════════════════════════════════════════════════════

/// One indexed version of a content item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: UniqueItemId,
    /// Location in the content tree
    pub path: String,
    pub content: String,
    /// Free-form fields (template, language, etc.)
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub indexed_at: DateTime<Utc>,
}

impl Document {
    pub fn new(id: UniqueItemId, path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
            content: content.into(),
            metadata: serde_json::Value::Null,
            indexed_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Mutation staged on an update context and applied on commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "target", rename_all = "snake_case")]
pub enum DocumentOp {
    /// Insert or replace one version
    Upsert(Document),
    /// Remove every version of an item
    DeleteItem(ItemId),
    /// Remove one version
    DeleteVersion(UniqueItemId),
}

/// Item as reported by a content source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceItem {
    pub id: UniqueItemId,
    pub path: String,
    pub content: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl SourceItem {
    pub fn new(id: UniqueItemId, path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
            content: content.into(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn to_document(&self) -> Document {
        Document::new(self.id.clone(), self.path.clone(), self.content.clone())
            .with_metadata(self.metadata.clone())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Port Traits
// ═══════════════════════════════════════════════════════════════════════════

/// Committed document storage, partitioned by index name
pub trait DocumentStore: Send + Sync {
    /// Apply `ops` in order, all or nothing
    fn apply(&self, index: &str, ops: &[DocumentOp]) -> Result<()>;

    fn get(&self, index: &str, id: &UniqueItemId) -> Result<Option<Document>>;

    /// Number of stored versions in `index`
    fn count(&self, index: &str) -> Result<usize>;

    /// Fails when `index` cannot accept a new batch
    fn check_ready(&self, _index: &str) -> Result<()> {
        Ok(())
    }
}

/// Content the crawlers read from
pub trait ItemSource: Send + Sync {
    /// Current state of one version, `None` if it no longer exists
    fn item(&self, id: &UniqueItemId) -> Result<Option<SourceItem>>;

    /// Every item below `root` (excluding the root), in tree order
    fn descendants(&self, root: &IndexableItem) -> Result<Vec<SourceItem>>;

    fn has_pending_items(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_item_to_document() {
        let item = SourceItem {
            metadata: serde_json::json!({"template": "page"}),
            ..SourceItem::new(UniqueItemId::new("home", "2"), "/content/home", "Hello")
        };
        let doc = item.to_document();

        assert_eq!(doc.id, item.id);
        assert_eq!(doc.path, "/content/home");
        assert_eq!(doc.content, "Hello");
        assert_eq!(doc.metadata["template"], "page");
    }

    #[test]
    fn test_document_op_serialization() {
        let op = DocumentOp::DeleteItem(ItemId::new("home"));
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["op"], "delete_item");
    }
}
