//! Countdown engine implementation.
//!
//! The engine is a wall-clock-based sampler. It does not own a thread or a
//! timer; the caller invokes `sample()` periodically and the engine
//! re-derives elapsed time from the bound cycle's start on every call.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Sampling -> Idle      (completion, interrupt or stop)
//! ```
//!
//! Because elapsed time is `now - start` rather than a tick count, late or
//! missed samples never delay completion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cycle::{Cycle, CycleId};

/// The cycle the engine is sampling against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub cycle_id: CycleId,
    pub start_date: DateTime<Utc>,
    pub total_seconds: u64,
}

impl Binding {
    pub fn for_cycle(cycle: &Cycle) -> Self {
        Self {
            cycle_id: cycle.id,
            start_date: cycle.start_date,
            total_seconds: cycle.total_seconds(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum EngineState {
    Idle,
    Sampling(Binding),
}

/// Outcome of a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    /// Not bound to a cycle; nothing to report.
    Idle,
    Progress {
        cycle_id: CycleId,
        elapsed_seconds: u64,
        total_seconds: u64,
    },
    /// Duration reached. Reported once; the engine is Idle afterwards.
    Completed {
        cycle_id: CycleId,
        total_seconds: u64,
    },
}

impl Sample {
    /// Elapsed seconds to display, clamped to the cycle's duration.
    pub fn elapsed_seconds(&self) -> Option<u64> {
        match *self {
            Sample::Idle => None,
            Sample::Progress {
                elapsed_seconds, ..
            } => Some(elapsed_seconds),
            Sample::Completed { total_seconds, .. } => Some(total_seconds),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Sample::Completed { .. })
    }
}

/// Countdown engine.
///
/// Holds only a read-only [`Binding`] to the active cycle. It never touches
/// cycle data; completion is reported to the caller, which owns the
/// transition.
#[derive(Debug, Clone, Serialize)]
pub struct CountdownEngine {
    state: EngineState,
    /// Last reported elapsed seconds; kept after going Idle.
    elapsed_seconds: u64,
}

impl Default for CountdownEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CountdownEngine {
    pub fn new() -> Self {
        Self {
            state: EngineState::Idle,
            elapsed_seconds: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_sampling(&self) -> bool {
        matches!(self.state, EngineState::Sampling(_))
    }

    pub fn binding(&self) -> Option<Binding> {
        match self.state {
            EngineState::Sampling(binding) => Some(binding),
            EngineState::Idle => None,
        }
    }

    pub fn bound_cycle_id(&self) -> Option<CycleId> {
        self.binding().map(|b| b.cycle_id)
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start sampling against `cycle` and take the first sample immediately.
    ///
    /// Any previous binding is released first.
    pub fn bind(&mut self, cycle: &Cycle, now: DateTime<Utc>) -> Sample {
        if let Some(previous) = self.bound_cycle_id() {
            debug!(cycle_id = %previous, "releasing previous binding");
        }
        self.state = EngineState::Sampling(Binding::for_cycle(cycle));
        self.elapsed_seconds = 0;
        debug!(cycle_id = %cycle.id, total_seconds = cycle.total_seconds(), "sampling started");
        self.sample(now)
    }

    /// Stop sampling. Returns false if the engine was already Idle.
    pub fn stop(&mut self) -> bool {
        match self.state {
            EngineState::Sampling(binding) => {
                debug!(cycle_id = %binding.cycle_id, "sampling stopped");
                self.state = EngineState::Idle;
                true
            }
            EngineState::Idle => false,
        }
    }

    /// Re-derive elapsed time from the wall clock.
    pub fn sample(&mut self, now: DateTime<Utc>) -> Sample {
        let EngineState::Sampling(binding) = self.state else {
            return Sample::Idle;
        };

        let elapsed = elapsed_whole_seconds(binding.start_date, now);
        if elapsed >= binding.total_seconds {
            self.elapsed_seconds = binding.total_seconds;
            self.state = EngineState::Idle;
            debug!(cycle_id = %binding.cycle_id, elapsed, "countdown complete");
            return Sample::Completed {
                cycle_id: binding.cycle_id,
                total_seconds: binding.total_seconds,
            };
        }

        self.elapsed_seconds = elapsed;
        Sample::Progress {
            cycle_id: binding.cycle_id,
            elapsed_seconds: elapsed,
            total_seconds: binding.total_seconds,
        }
    }
}

/// Whole seconds between `start` and `now`, rounded down. A clock reading
/// earlier than `start` counts as zero.
pub fn elapsed_whole_seconds(start: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from((now - start).num_seconds()).unwrap_or(0)
}
