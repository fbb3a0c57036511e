//! The cycle store: single owner of [`CycleHistory`].

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::history::{Applied, CycleAction, CycleHistory};
use super::model::{Cycle, CycleId};
use crate::clock::{Clock, SystemClock};
use crate::error::CycleError;
use crate::events::Event;

/// Owns the cycle history and the elapsed-seconds counter shown by the
/// countdown. All transitions go through [`CycleStore::dispatch`].
#[derive(Debug, Clone)]
pub struct CycleStore {
    history: CycleHistory,
    elapsed_seconds: u64,
    clock: Arc<dyn Clock>,
}

impl Default for CycleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            history: CycleHistory::new(),
            elapsed_seconds: 0,
            clock,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn history(&self) -> &CycleHistory {
        &self.history
    }

    pub fn cycles(&self) -> &[Arc<Cycle>] {
        self.history.cycles()
    }

    pub fn active_cycle(&self) -> Option<&Cycle> {
        self.history.active_cycle()
    }

    pub fn active_cycle_id(&self) -> Option<CycleId> {
        self.history.active_cycle_id()
    }

    pub fn get(&self, id: CycleId) -> Option<&Cycle> {
        self.history.get(id)
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn task_suggestions(&self) -> Vec<&str> {
        self.history.task_suggestions()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Apply one action against the current time.
    ///
    /// Returns the resulting event, `None` for a no-op, or the rejection.
    /// A rejected action leaves the store exactly as it was.
    pub fn dispatch(&mut self, action: CycleAction) -> Result<Option<Event>, CycleError> {
        let name = action.name();
        match self.history.reduce(action, self.clock.now()) {
            Ok(Some(applied)) => Ok(Some(self.commit(applied))),
            Ok(None) => {
                debug!(action = name, "no active cycle, ignoring");
                Ok(None)
            }
            Err(err) => Err(rejected(name, err)),
        }
    }

    /// Start a new cycle and make it active.
    ///
    /// Returns the new id together with its `CycleStarted` event.
    pub fn create_cycle(
        &mut self,
        task: impl Into<String>,
        duration_minutes: u32,
    ) -> Result<(CycleId, Event), CycleError> {
        let id = CycleId::new();
        let applied = self
            .history
            .create(id, task.into(), duration_minutes, self.clock.now())
            .map_err(|err| rejected("create_cycle", err))?;
        Ok((id, self.commit(applied)))
    }

    /// Interrupt the active cycle. No-op when nothing is active.
    pub fn interrupt(&mut self) -> Option<Event> {
        self.dispatch(CycleAction::Interrupt).ok().flatten()
    }

    /// Mark the active cycle finished. No-op when nothing is active.
    ///
    /// Meant to be driven by the countdown, not by user input.
    pub fn mark_active_cycle_finished(&mut self) -> Option<Event> {
        self.dispatch(CycleAction::Finish).ok().flatten()
    }

    pub fn set_elapsed_seconds(&mut self, seconds: u64) {
        self.elapsed_seconds = seconds;
    }

    fn commit(&mut self, applied: Applied) -> Event {
        let Applied { history, event } = applied;
        debug_assert_eq!(history.check_invariants(), Ok(()));
        debug_assert!(history.len() >= self.history.len());

        self.history = history;
        match &event {
            Event::CycleStarted {
                cycle_id,
                task,
                duration_minutes,
                ..
            } => {
                self.elapsed_seconds = 0;
                info!(%cycle_id, task = %task, duration_minutes, "cycle started");
            }
            Event::CycleInterrupted { cycle_id, .. } => {
                info!(%cycle_id, elapsed_seconds = self.elapsed_seconds, "cycle interrupted");
            }
            Event::CycleFinished { cycle_id, .. } => {
                info!(%cycle_id, "cycle finished");
            }
            Event::CountdownTick { .. } | Event::StateSnapshot { .. } => {}
        }
        event
    }
}

fn rejected(action: &'static str, err: CycleError) -> CycleError {
    warn!(action, error = %err, "cycle action rejected");
    err
}
