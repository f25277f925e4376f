//! In-memory adapters
//!
//! `MemoryDocumentStore` applies a batch under one write lock, so readers see
//! either none or all of a commit. `MemoryItemSource` is a path-keyed content
//! tree for wiring crawlers without a real content backend.

use contentsearch_maintenance::{IndexableItem, UniqueItemId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::domain::{Document, DocumentOp, DocumentStore, ItemSource, SourceItem};
use crate::Result;

type Partition = HashMap<UniqueItemId, Document>;

#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    indexes: RwLock<HashMap<String, Partition>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored versions of `index`, sorted by id
    pub fn documents(&self, index: &str) -> Vec<Document> {
        let indexes = self.indexes.read();
        let mut docs: Vec<Document> = indexes
            .get(index)
            .map(|p| p.values().cloned().collect())
            .unwrap_or_default();
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        docs
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn apply(&self, index: &str, ops: &[DocumentOp]) -> Result<()> {
        let mut indexes = self.indexes.write();
        let partition = indexes.entry(index.to_string()).or_default();

        for op in ops {
            match op {
                DocumentOp::Upsert(doc) => {
                    partition.insert(doc.id.clone(), doc.clone());
                }
                DocumentOp::DeleteItem(item) => {
                    partition.retain(|id, _| id.item != *item);
                }
                DocumentOp::DeleteVersion(id) => {
                    partition.remove(id);
                }
            }
        }
        Ok(())
    }

    fn get(&self, index: &str, id: &UniqueItemId) -> Result<Option<Document>> {
        Ok(self
            .indexes
            .read()
            .get(index)
            .and_then(|p| p.get(id))
            .cloned())
    }

    fn count(&self, index: &str) -> Result<usize> {
        Ok(self.indexes.read().get(index).map_or(0, |p| p.len()))
    }
}

/// Content tree held in memory
#[derive(Debug)]
pub struct MemoryItemSource {
    items: RwLock<HashMap<UniqueItemId, SourceItem>>,
    pending: AtomicBool,
}

impl Default for MemoryItemSource {
    fn default() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            pending: AtomicBool::new(true),
        }
    }
}

impl MemoryItemSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, item: SourceItem) {
        self.items.write().insert(item.id.clone(), item);
    }

    pub fn remove(&self, id: &UniqueItemId) -> Option<SourceItem> {
        self.items.write().remove(id)
    }

    pub fn set_pending(&self, pending: bool) {
        self.pending.store(pending, Ordering::SeqCst);
    }
}

impl ItemSource for MemoryItemSource {
    fn item(&self, id: &UniqueItemId) -> Result<Option<SourceItem>> {
        Ok(self.items.read().get(id).cloned())
    }

    fn descendants(&self, root: &IndexableItem) -> Result<Vec<SourceItem>> {
        let prefix = format!("{}/", root.path.trim_end_matches('/'));
        let mut found: Vec<SourceItem> = self
            .items
            .read()
            .values()
            .filter(|item| item.path.starts_with(&prefix))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }

    fn has_pending_items(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentsearch_maintenance::ItemId;

    fn doc(item: &str, version: &str) -> Document {
        Document::new(
            UniqueItemId::new(item, version),
            format!("/content/{}", item),
            "body",
        )
    }

    #[test]
    fn test_upsert_and_get() {
        let store = MemoryDocumentStore::new();
        store
            .apply("pages", &[DocumentOp::Upsert(doc("home", "1"))])
            .unwrap();

        let found = store
            .get("pages", &UniqueItemId::new("home", "1"))
            .unwrap()
            .unwrap();
        assert_eq!(found.path, "/content/home");
        assert!(store
            .get("other", &UniqueItemId::new("home", "1"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_delete_item_removes_every_version() {
        let store = MemoryDocumentStore::new();
        store
            .apply(
                "pages",
                &[
                    DocumentOp::Upsert(doc("home", "1")),
                    DocumentOp::Upsert(doc("home", "2")),
                    DocumentOp::Upsert(doc("about", "1")),
                ],
            )
            .unwrap();
        assert_eq!(store.count("pages").unwrap(), 3);

        store
            .apply("pages", &[DocumentOp::DeleteItem(ItemId::new("home"))])
            .unwrap();
        assert_eq!(store.count("pages").unwrap(), 1);
        assert_eq!(store.documents("pages")[0].id.item.as_str(), "about");
    }

    #[test]
    fn test_delete_version_keeps_siblings() {
        let store = MemoryDocumentStore::new();
        store
            .apply(
                "pages",
                &[
                    DocumentOp::Upsert(doc("home", "1")),
                    DocumentOp::Upsert(doc("home", "2")),
                    DocumentOp::DeleteVersion(UniqueItemId::new("home", "1")),
                ],
            )
            .unwrap();

        let docs = store.documents("pages");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id.version, "2");
    }

    #[test]
    fn test_indexes_are_partitioned() {
        let store = MemoryDocumentStore::new();
        store
            .apply("a", &[DocumentOp::Upsert(doc("home", "1"))])
            .unwrap();

        assert_eq!(store.count("a").unwrap(), 1);
        assert_eq!(store.count("b").unwrap(), 0);
    }

    #[test]
    fn test_descendants_by_path_prefix() {
        let source = MemoryItemSource::new();
        for (item, path) in [
            ("root", "/content"),
            ("home", "/content/home"),
            ("news", "/content/home/news"),
            ("other", "/contentx/page"),
        ] {
            source.insert(SourceItem::new(UniqueItemId::new(item, "1"), path, ""));
        }

        let root = IndexableItem::new(UniqueItemId::new("root", "1"), "/content");
        let paths: Vec<_> = source
            .descendants(&root)
            .unwrap()
            .into_iter()
            .map(|i| i.path)
            .collect();

        assert_eq!(paths, vec!["/content/home", "/content/home/news"]);
    }

    #[test]
    fn test_source_pending_flag() {
        let source = MemoryItemSource::new();
        assert!(source.has_pending_items());
        source.set_pending(false);
        assert!(!source.has_pending_items());
    }
}
