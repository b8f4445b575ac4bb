use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of one save cycle, published on the middleware's optional
/// observation channel.
///
/// Nothing in the dispatch path depends on these events; without a
/// subscriber they are dropped.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SaveEvent {
    /// The engine accepted the state.
    Saved {
        cycle: u64,
        /// Whether the SAVE action was dispatched back into the pipeline.
        dispatched: bool,
        timestamp: DateTime<Utc>,
    },

    /// The engine rejected the state. The failure is otherwise swallowed.
    Failed {
        cycle: u64,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl SaveEvent {
    pub fn saved(cycle: u64, dispatched: bool) -> Self {
        SaveEvent::Saved {
            cycle,
            dispatched,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(cycle: u64, reason: impl Into<String>) -> Self {
        SaveEvent::Failed {
            cycle,
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn cycle(&self) -> u64 {
        match self {
            SaveEvent::Saved { cycle, .. } | SaveEvent::Failed { cycle, .. } => *cycle,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SaveEvent::Failed { .. })
    }
}
