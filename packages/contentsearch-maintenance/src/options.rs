use serde::{Deserialize, Serialize};

/// Per-call indexing options
///
/// Only `Disabled` influences gating. `ForceSync` and `ForceAsync` are
/// scheduling hints for the layers around the index and are handed to
/// crawlers untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexingOptions {
    /// Honor the index's normal enable/disable state
    #[default]
    Default,
    /// Never run
    Disabled,
    /// Run synchronously where the caller would otherwise schedule
    ForceSync,
    /// Run asynchronously where the caller would otherwise block
    ForceAsync,
}

impl IndexingOptions {
    pub fn is_disabled(&self) -> bool {
        matches!(self, IndexingOptions::Disabled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexingOptions::Default => "default",
            IndexingOptions::Disabled => "disabled",
            IndexingOptions::ForceSync => "force_sync",
            IndexingOptions::ForceAsync => "force_async",
        }
    }
}

impl std::fmt::Display for IndexingOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
