use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cycle::CycleId;

/// Every effective state change produces an Event.
/// No-op transitions produce none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    CycleStarted {
        cycle_id: CycleId,
        task: String,
        duration_minutes: u32,
        at: DateTime<Utc>,
    },
    CycleInterrupted {
        cycle_id: CycleId,
        at: DateTime<Utc>,
    },
    CycleFinished {
        cycle_id: CycleId,
        at: DateTime<Utc>,
    },
    /// Progress sample taken while a cycle is running.
    CountdownTick {
        cycle_id: CycleId,
        elapsed_seconds: u64,
        remaining_seconds: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        active_cycle_id: Option<CycleId>,
        task: Option<String>,
        elapsed_seconds: u64,
        remaining_seconds: u64,
        display: String,
        cycles: usize,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// True for the two events that end a cycle.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Event::CycleInterrupted { .. } | Event::CycleFinished { .. }
        )
    }
}
