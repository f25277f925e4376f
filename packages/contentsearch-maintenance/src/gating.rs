//! Gating - decides whether an indexing operation may run right now
//!
//! Consulted once when an operation starts and again before every unit of
//! work inside a batch, so flipping the shared state from another thread
//! interrupts a long batch at the next identity.

use crate::options::IndexingOptions;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::info;

/// Enablement state of an index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexingState {
    #[default]
    Started,
    Paused,
    Stopped,
}

impl IndexingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexingState::Started => "started",
            IndexingState::Paused => "paused",
            IndexingState::Stopped => "stopped",
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            IndexingState::Started => 0,
            IndexingState::Paused => 1,
            IndexingState::Stopped => 2,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => IndexingState::Started,
            1 => IndexingState::Paused,
            _ => IndexingState::Stopped,
        }
    }
}

impl std::fmt::Display for IndexingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shared, cloneable view of an index's enablement state
#[derive(Debug, Clone, Default)]
pub struct IndexingStateHandle {
    state: Arc<AtomicU8>,
}

impl IndexingStateHandle {
    pub fn new(initial: IndexingState) -> Self {
        Self {
            state: Arc::new(AtomicU8::new(initial.to_u8())),
        }
    }

    pub fn get(&self) -> IndexingState {
        IndexingState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn set(&self, state: IndexingState) {
        let previous = IndexingState::from_u8(self.state.swap(state.to_u8(), Ordering::AcqRel));
        if previous != state {
            info!(from = %previous, to = %state, "Indexing state changed");
        }
    }

    pub fn pause(&self) {
        self.set(IndexingState::Paused);
    }

    pub fn resume(&self) {
        self.set(IndexingState::Started);
    }

    pub fn stop(&self) {
        self.set(IndexingState::Stopped);
    }
}

/// Gating policy trait (pluggable)
pub trait GatingPolicy: Send + Sync {
    /// Pure decision over the current enablement state and the call's options
    fn should_proceed(&self, options: IndexingOptions) -> bool;
}

impl<F> GatingPolicy for F
where
    F: Fn(IndexingOptions) -> bool + Send + Sync,
{
    fn should_proceed(&self, options: IndexingOptions) -> bool {
        self(options)
    }
}

/// Default gate: proceed iff options are not `Disabled` and the index is started
#[derive(Debug, Clone, Default)]
pub struct IndexGate {
    state: IndexingStateHandle,
}

impl IndexGate {
    pub fn new(state: IndexingStateHandle) -> Self {
        Self { state }
    }

    pub fn with_state(initial: IndexingState) -> Self {
        Self::new(IndexingStateHandle::new(initial))
    }

    pub fn state(&self) -> &IndexingStateHandle {
        &self.state
    }
}

impl GatingPolicy for IndexGate {
    fn should_proceed(&self, options: IndexingOptions) -> bool {
        !options.is_disabled() && self.state.get() == IndexingState::Started
    }
}
