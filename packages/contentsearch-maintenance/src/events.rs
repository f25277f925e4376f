//! Indexing lifecycle notifications
//!
//! Every batch update announces itself twice: a synchronous signal raised on
//! the notifier (`indexing:start` / `indexing:end`) and a durable event queued
//! for later consumers. Both carry the index name and the full-rebuild flag.

use crate::config::{EventsConfig, DEFAULT_QUEUE_CAPACITY};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const INDEXING_START: &str = "indexing:start";
pub const INDEXING_END: &str = "indexing:end";

/// Arguments of the synchronous signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexingEventArgs {
    pub index_name: String,
    pub full_rebuild: bool,
}

/// Durable event payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndexingEvent {
    Started {
        index_name: String,
        full_rebuild: bool,
    },
    Finished {
        index_name: String,
        full_rebuild: bool,
    },
}

impl IndexingEvent {
    pub fn started(index_name: impl Into<String>, full_rebuild: bool) -> Self {
        IndexingEvent::Started {
            index_name: index_name.into(),
            full_rebuild,
        }
    }

    pub fn finished(index_name: impl Into<String>, full_rebuild: bool) -> Self {
        IndexingEvent::Finished {
            index_name: index_name.into(),
            full_rebuild,
        }
    }

    pub fn index_name(&self) -> &str {
        match self {
            IndexingEvent::Started { index_name, .. } => index_name,
            IndexingEvent::Finished { index_name, .. } => index_name,
        }
    }

    /// Name of the matching synchronous signal
    pub fn signal_name(&self) -> &'static str {
        match self {
            IndexingEvent::Started { .. } => INDEXING_START,
            IndexingEvent::Finished { .. } => INDEXING_END,
        }
    }
}

/// Event sink trait
pub trait EventNotifier: Send + Sync {
    /// Synchronous signal to in-process subscribers
    fn raise_event(&self, name: &str, args: &IndexingEventArgs);

    /// Durable event for out-of-band consumers
    fn queue_event(&self, event: IndexingEvent);
}

/// Notifier that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl EventNotifier for TracingNotifier {
    fn raise_event(&self, name: &str, args: &IndexingEventArgs) {
        info!(
            event = name,
            index = %args.index_name,
            full_rebuild = args.full_rebuild,
            "Indexing signal"
        );
    }

    fn queue_event(&self, event: IndexingEvent) {
        debug!(event = event.signal_name(), index = event.index_name(), "Indexing event queued");
    }
}

/// Fans every notification out to several notifiers, in order
#[derive(Clone, Default)]
pub struct CompositeNotifier {
    notifiers: Vec<Arc<dyn EventNotifier>>,
}

impl CompositeNotifier {
    pub fn new(notifiers: Vec<Arc<dyn EventNotifier>>) -> Self {
        Self { notifiers }
    }

    pub fn push(&mut self, notifier: Arc<dyn EventNotifier>) {
        self.notifiers.push(notifier);
    }
}

impl EventNotifier for CompositeNotifier {
    fn raise_event(&self, name: &str, args: &IndexingEventArgs) {
        for notifier in &self.notifiers {
            notifier.raise_event(name, args);
        }
    }

    fn queue_event(&self, event: IndexingEvent) {
        for notifier in &self.notifiers {
            notifier.queue_event(event.clone());
        }
    }
}

/// Queued event envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedEvent {
    pub id: Uuid,
    pub queued_at: DateTime<Utc>,
    pub event: IndexingEvent,
}

/// In-memory event queue, bounded (oldest events dropped first)
pub struct QueuedEventStore {
    events: Mutex<VecDeque<QueuedEvent>>,
    capacity: usize,
}

impl QueuedEventStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Queue bounded by `events.queue_capacity`
    pub fn from_config(config: &EventsConfig) -> Self {
        Self::new(config.queue_capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn push(&self, event: IndexingEvent) -> Uuid {
        let queued = QueuedEvent {
            id: Uuid::new_v4(),
            queued_at: Utc::now(),
            event,
        };
        let id = queued.id;

        let mut events = self.events.lock();
        if events.len() == self.capacity {
            if let Some(dropped) = events.pop_front() {
                warn!(
                    id = %dropped.id,
                    capacity = self.capacity,
                    "Event queue full, dropping oldest event"
                );
            }
        }
        events.push_back(queued);
        id
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Copy of the queued events, oldest first
    pub fn snapshot(&self) -> Vec<QueuedEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Remove and return all queued events, oldest first
    pub fn drain(&self) -> Vec<QueuedEvent> {
        self.events.lock().drain(..).collect()
    }

    /// One JSON document per line
    pub fn to_json_lines(&self) -> serde_json::Result<String> {
        let events = self.events.lock();
        let mut out = String::new();
        for event in events.iter() {
            out.push_str(&serde_json::to_string(event)?);
            out.push('\n');
        }
        Ok(out)
    }
}

impl Default for QueuedEventStore {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl EventNotifier for QueuedEventStore {
    fn raise_event(&self, name: &str, args: &IndexingEventArgs) {
        debug!(event = name, index = %args.index_name, "Signal ignored by event queue");
    }

    fn queue_event(&self, event: IndexingEvent) {
        self.push(event);
    }
}
