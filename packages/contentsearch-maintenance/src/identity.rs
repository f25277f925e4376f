//! Item identities handed to crawlers
//!
//! `ItemId` names the current revision target of an item, `UniqueItemId`
//! pins one exact version of it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of a content item (any version)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identity of one specific version of a content item
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UniqueItemId {
    pub item: ItemId,
    pub version: String,
}

impl UniqueItemId {
    pub fn new(item: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            item: ItemId::new(item),
            version: version.into(),
        }
    }

    pub fn item(&self) -> &ItemId {
        &self.item
    }
}

impl fmt::Display for UniqueItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.item, self.version)
    }
}

impl FromStr for UniqueItemId {
    type Err = String;

    /// Parse `"{item}@{version}"`; the version is everything after the last `@`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once('@') {
            Some((item, version)) if !item.is_empty() && !version.is_empty() => {
                Ok(Self::new(item, version))
            }
            _ => Err(format!("Invalid unique item id: {}", s)),
        }
    }
}

/// What a delete call removes: every version of an item, or one version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DeleteTarget {
    Item(ItemId),
    Version(UniqueItemId),
}

impl DeleteTarget {
    pub fn item(&self) -> &ItemId {
        match self {
            DeleteTarget::Item(id) => id,
            DeleteTarget::Version(uid) => &uid.item,
        }
    }
}

impl fmt::Display for DeleteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteTarget::Item(id) => write!(f, "{}", id),
            DeleteTarget::Version(uid) => write!(f, "{}", uid),
        }
    }
}

/// Starting point of a full-tree refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexableItem {
    pub unique_id: UniqueItemId,
    /// Location of the item in the content tree (e.g. "/sitecore/content/home")
    pub path: String,
}

impl IndexableItem {
    pub fn new(unique_id: UniqueItemId, path: impl Into<String>) -> Self {
        Self {
            unique_id,
            path: path.into(),
        }
    }
}
