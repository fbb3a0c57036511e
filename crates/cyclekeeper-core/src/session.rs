//! Composition of the cycle store and the countdown engine.
//!
//! A [`CycleSession`] is owned by whatever drives the application (the CLI,
//! a GUI shell, a test). It is the only place where engine samples turn into
//! store transitions.

use std::sync::Arc;

use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::countdown::{CountdownDisplay, CountdownEngine, Sample};
use crate::cycle::{Cycle, CycleHistory, CycleId, CycleStore};
use crate::error::CycleError;
use crate::events::Event;

/// Result of [`CycleSession::start_cycle`].
#[derive(Debug, Clone, PartialEq)]
pub struct StartedCycle {
    pub id: CycleId,
    /// Events produced by the start, in order.
    pub events: Vec<Event>,
}

#[derive(Debug, Clone)]
pub struct CycleSession {
    store: CycleStore,
    engine: CountdownEngine,
    clock: Arc<dyn Clock>,
}

impl Default for CycleSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleSession {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            store: CycleStore::with_clock(Arc::clone(&clock)),
            engine: CountdownEngine::new(),
            clock,
        }
    }

    // ── Read model ───────────────────────────────────────────────────

    pub fn store(&self) -> &CycleStore {
        &self.store
    }

    pub fn engine(&self) -> &CountdownEngine {
        &self.engine
    }

    pub fn history(&self) -> &CycleHistory {
        self.store.history()
    }

    pub fn active_cycle(&self) -> Option<&Cycle> {
        self.store.active_cycle()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.store.elapsed_seconds()
    }

    pub fn is_sampling(&self) -> bool {
        self.engine.is_sampling()
    }

    pub fn task_suggestions(&self) -> Vec<&str> {
        self.store.task_suggestions()
    }

    /// Remaining time for the active cycle, or `00:00` when none is active.
    pub fn display(&self) -> CountdownDisplay {
        match self.store.active_cycle() {
            Some(cycle) => CountdownDisplay::new(cycle.total_seconds(), self.store.elapsed_seconds()),
            None => CountdownDisplay::idle(),
        }
    }

    /// Window or terminal title while a cycle runs.
    pub fn title(&self) -> Option<String> {
        self.store.active_cycle().map(|_| self.display().to_string())
    }

    /// Whether a start request for `task` would be accepted right now.
    pub fn can_start(&self, task: &str) -> bool {
        !task.trim().is_empty() && self.store.active_cycle_id().is_none()
    }

    pub fn snapshot(&self) -> Event {
        let active = self.store.active_cycle();
        let display = self.display();
        Event::StateSnapshot {
            active_cycle_id: active.map(|c| c.id),
            task: active.map(|c| c.task.clone()),
            elapsed_seconds: self.store.elapsed_seconds(),
            remaining_seconds: display.remaining_seconds(),
            display: display.to_string(),
            cycles: self.store.history().len(),
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Create a cycle and start sampling it.
    ///
    /// The returned events are the `CycleStarted` transition followed by the
    /// first countdown sample.
    pub fn start_cycle(
        &mut self,
        task: impl Into<String>,
        duration_minutes: u32,
    ) -> Result<StartedCycle, CycleError> {
        let (id, started) = self.store.create_cycle(task, duration_minutes)?;
        let mut events = vec![started];
        if let Some(cycle) = self.store.get(id) {
            let sample = self.engine.bind(cycle, self.clock.now());
            events.extend(self.apply(sample));
        }
        Ok(StartedCycle { id, events })
    }

    /// Take one sample. Returns a progress tick, the finish event, or
    /// `None` when no cycle is active.
    pub fn tick(&mut self) -> Option<Event> {
        let sample = self.sample_active();
        self.apply(sample)
    }

    /// Interrupt the active cycle.
    ///
    /// If the wall clock already shows the cycle complete, the cycle is
    /// finished instead and the finish event is returned.
    pub fn interrupt(&mut self) -> Option<Event> {
        let sample = self.sample_active();
        if sample.is_completed() {
            return self.apply(sample);
        }
        self.engine.stop();
        self.store.interrupt()
    }

    /// Stop sampling without ending the cycle. The next [`tick`] or
    /// [`interrupt`] re-binds to the active cycle and catches up from the
    /// wall clock.
    ///
    /// [`tick`]: CycleSession::tick
    /// [`interrupt`]: CycleSession::interrupt
    pub fn stop_sampling(&mut self) -> bool {
        self.engine.stop()
    }

    /// Sample the store's active cycle, binding the engine to it first if
    /// it is idle or bound to a cycle that already ended.
    fn sample_active(&mut self) -> Sample {
        let now = self.clock.now();
        let active_id = self.store.active_cycle_id();
        if self.engine.bound_cycle_id() == active_id {
            return self.engine.sample(now);
        }

        if let Some(bound) = self.engine.bound_cycle_id() {
            debug!(cycle_id = %bound, "bound cycle no longer active");
            self.engine.stop();
        }
        match self.store.active_cycle() {
            Some(cycle) => {
                debug!(cycle_id = %cycle.id, "resuming countdown");
                self.engine.bind(cycle, now)
            }
            None => Sample::Idle,
        }
    }

    fn apply(&mut self, sample: Sample) -> Option<Event> {
        match sample {
            Sample::Idle => None,
            Sample::Progress {
                cycle_id,
                elapsed_seconds,
                total_seconds,
            } => {
                self.store.set_elapsed_seconds(elapsed_seconds);
                Some(Event::CountdownTick {
                    cycle_id,
                    elapsed_seconds,
                    remaining_seconds: total_seconds.saturating_sub(elapsed_seconds),
                    at: self.clock.now(),
                })
            }
            Sample::Completed { total_seconds, .. } => {
                self.store.set_elapsed_seconds(total_seconds);
                self.store.mark_active_cycle_finished()
            }
        }
    }
}
