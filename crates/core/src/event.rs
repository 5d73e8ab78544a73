//! Pipeline event system — progress and observability without coupling.
//!
//! The orchestrator publishes an event at every stage boundary. The CLI
//! subscribes to print progress; tests subscribe to assert ordering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;

/// The four model-backed stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Research,
    Validation,
    Writer,
    Citation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Research => "research",
            Self::Validation => "validation",
            Self::Writer => "writer",
            Self::Citation => "citation",
        };
        f.write_str(s)
    }
}

/// All pipeline events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// A run was accepted
    RunStarted {
        topic: String,
        timestamp: DateTime<Utc>,
    },

    /// A stage is about to call its model
    StageStarted {
        stage: Stage,
        model: String,
        timestamp: DateTime<Utc>,
    },

    /// A stage finished
    StageCompleted {
        stage: Stage,
        /// Items the stage produced (facts, references, ...)
        items: usize,
        /// Model output lines rejected by the stage parser
        rejected_lines: usize,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// Validated facts were written back to memory
    FactsStored {
        count: usize,
        timestamp: DateTime<Utc>,
    },

    /// The final article is ready
    RunFinished {
        topic: String,
        article_chars: usize,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for pipeline events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<PipelineEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: PipelineEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<PipelineEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
