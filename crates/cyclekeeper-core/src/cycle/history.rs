//! Cycle history and its transition function.
//!
//! [`CycleHistory::reduce`] is pure: it takes the current history, an action
//! and the current time, and returns the next history. Entries are shared
//! through `Arc`, so a transition rebuilds only the entry it changes and the
//! rest stay pointer-equal to the previous value.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::model::{Cycle, CycleId};
use crate::error::{CycleError, ValidationError};
use crate::events::Event;

/// Closed set of transitions on a [`CycleHistory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleAction {
    CreateCycle {
        id: CycleId,
        task: String,
        duration_minutes: u32,
    },
    Interrupt,
    Finish,
}

impl CycleAction {
    /// Create action with a freshly generated id.
    pub fn create(task: impl Into<String>, duration_minutes: u32) -> Self {
        CycleAction::CreateCycle {
            id: CycleId::new(),
            task: task.into(),
            duration_minutes,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CycleAction::CreateCycle { .. } => "create_cycle",
            CycleAction::Interrupt => "interrupt",
            CycleAction::Finish => "finish",
        }
    }
}

/// Result of an effective transition.
#[derive(Debug, Clone)]
pub struct Applied {
    pub history: CycleHistory,
    pub event: Event,
}

/// A broken history invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("active cycle {0} is not in history")]
    DanglingActiveId(CycleId),
    #[error("active cycle {0} already has a terminal timestamp")]
    ActiveCycleTerminal(CycleId),
    #[error("cycle {0} appears more than once")]
    DuplicateId(CycleId),
    #[error("cycle {0} is both interrupted and finished")]
    DoubleTerminal(CycleId),
    #[error("cycle {0} is neither active nor terminal")]
    OrphanedCycle(CycleId),
    #[error("cycle {0} ended before it started")]
    EndedBeforeStart(CycleId),
}

/// Ordered, append-only list of cycles plus the active pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleHistory {
    cycles: Vec<Arc<Cycle>>,
    active_cycle_id: Option<CycleId>,
}

impl CycleHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cycles(&self) -> &[Arc<Cycle>] {
        &self.cycles
    }

    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    pub fn active_cycle_id(&self) -> Option<CycleId> {
        self.active_cycle_id
    }

    pub fn active_cycle(&self) -> Option<&Cycle> {
        let id = self.active_cycle_id?;
        self.get(id)
    }

    pub fn get(&self, id: CycleId) -> Option<&Cycle> {
        self.cycles.iter().find(|c| c.id == id).map(|c| &**c)
    }

    /// Distinct task labels, most recently used first.
    pub fn task_suggestions(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.cycles
            .iter()
            .rev()
            .map(|c| c.task.as_str())
            .filter(|task| seen.insert(*task))
            .collect()
    }

    /// Apply one action.
    ///
    /// Returns `Ok(None)` when the action is a no-op (interrupt or finish with
    /// nothing active). Rejected actions leave `self` untouched.
    pub fn reduce(
        &self,
        action: CycleAction,
        now: DateTime<Utc>,
    ) -> Result<Option<Applied>, CycleError> {
        match action {
            CycleAction::CreateCycle {
                id,
                task,
                duration_minutes,
            } => self.create(id, task, duration_minutes, now).map(Some),
            CycleAction::Interrupt => Ok(self.end_active(now, |cycle, at| {
                (
                    cycle.with_interrupted(at),
                    Event::CycleInterrupted {
                        cycle_id: cycle.id,
                        at,
                    },
                )
            })),
            CycleAction::Finish => Ok(self.end_active(now, |cycle, at| {
                (
                    cycle.with_finished(at),
                    Event::CycleFinished {
                        cycle_id: cycle.id,
                        at,
                    },
                )
            })),
        }
    }

    pub(crate) fn create(
        &self,
        id: CycleId,
        task: String,
        duration_minutes: u32,
        now: DateTime<Utc>,
    ) -> Result<Applied, CycleError> {
        if task.trim().is_empty() {
            return Err(ValidationError::EmptyTask.into());
        }
        if duration_minutes == 0 {
            return Err(ValidationError::NonPositiveDuration {
                minutes: i64::from(duration_minutes),
            }
            .into());
        }
        if let Some(active_id) = self.active_cycle_id {
            return Err(CycleError::AlreadyActive { active_id });
        }
        if self.get(id).is_some() {
            return Err(CycleError::DuplicateId { id });
        }

        let event = Event::CycleStarted {
            cycle_id: id,
            task: task.clone(),
            duration_minutes,
            at: now,
        };
        let mut cycles = self.cycles.clone();
        cycles.push(Arc::new(Cycle::started(id, task, duration_minutes, now)));

        Ok(Applied {
            history: CycleHistory {
                cycles,
                active_cycle_id: Some(id),
            },
            event,
        })
    }

    fn end_active<F>(&self, now: DateTime<Utc>, end: F) -> Option<Applied>
    where
        F: FnOnce(&Cycle, DateTime<Utc>) -> (Cycle, Event),
    {
        let active_id = self.active_cycle_id?;
        let index = self.cycles.iter().position(|c| c.id == active_id)?;
        let current = &self.cycles[index];
        if current.is_terminal() {
            return None;
        }

        // A wall clock stepped backwards must not end a cycle before it began.
        let at = now.max(current.start_date);
        let (updated, event) = end(current, at);
        let mut cycles = self.cycles.clone();
        cycles[index] = Arc::new(updated);

        Some(Applied {
            history: CycleHistory {
                cycles,
                active_cycle_id: None,
            },
            event,
        })
    }

    /// Check every structural invariant, returning the first violation.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut ids = HashSet::new();
        for cycle in &self.cycles {
            if !ids.insert(cycle.id) {
                return Err(InvariantViolation::DuplicateId(cycle.id));
            }
            if cycle.interrupted_date.is_some() && cycle.finished_date.is_some() {
                return Err(InvariantViolation::DoubleTerminal(cycle.id));
            }
            if cycle.ended_at().is_some_and(|end| end < cycle.start_date) {
                return Err(InvariantViolation::EndedBeforeStart(cycle.id));
            }
            if !cycle.is_terminal() && self.active_cycle_id != Some(cycle.id) {
                return Err(InvariantViolation::OrphanedCycle(cycle.id));
            }
        }

        if let Some(active_id) = self.active_cycle_id {
            match self.get(active_id) {
                None => return Err(InvariantViolation::DanglingActiveId(active_id)),
                Some(cycle) if cycle.is_terminal() => {
                    return Err(InvariantViolation::ActiveCycleTerminal(active_id))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn started(task: &str, minutes: u32) -> CycleHistory {
        CycleHistory::new()
            .reduce(CycleAction::create(task, minutes), t0())
            .unwrap()
            .unwrap()
            .history
    }

    #[test]
    fn create_appends_and_activates() {
        let history = started("Write spec", 25);
        assert_eq!(history.len(), 1);
        let active = history.active_cycle().unwrap();
        assert_eq!(active.task, "Write spec");
        assert_eq!(active.duration_minutes, 25);
        assert_eq!(active.start_date, t0());
        assert!(history.check_invariants().is_ok());
    }

    #[test]
    fn create_rejects_empty_task() {
        let history = CycleHistory::new();
        let err = history
            .reduce(CycleAction::create("   ", 25), t0())
            .unwrap_err();
        assert_eq!(err, CycleError::InvalidInput(ValidationError::EmptyTask));
        assert!(history.is_empty());
    }

    #[test]
    fn create_rejects_zero_duration() {
        let err = CycleHistory::new()
            .reduce(CycleAction::create("Focus", 0), t0())
            .unwrap_err();
        assert!(matches!(
            err,
            CycleError::InvalidInput(ValidationError::NonPositiveDuration { minutes: 0 })
        ));
    }

    #[test]
    fn create_while_active_is_rejected() {
        let history = started("First", 25);
        let first_id = history.active_cycle_id().unwrap();
        let err = history
            .reduce(CycleAction::create("Second", 10), t0())
            .unwrap_err();
        assert_eq!(err, CycleError::AlreadyActive { active_id: first_id });
        assert_eq!(history.len(), 1);
        assert_eq!(history.active_cycle_id(), Some(first_id));
    }

    #[test]
    fn create_rejects_duplicate_id() {
        let history = started("First", 25);
        let id = history.cycles()[0].id;
        let ended = history
            .reduce(CycleAction::Finish, t0())
            .unwrap()
            .unwrap()
            .history;
        let err = ended
            .reduce(
                CycleAction::CreateCycle {
                    id,
                    task: "Again".into(),
                    duration_minutes: 5,
                },
                t0(),
            )
            .unwrap_err();
        assert_eq!(err, CycleError::DuplicateId { id });
    }

    #[test]
    fn interrupt_and_finish_are_noops_without_active_cycle() {
        let history = CycleHistory::new();
        assert!(history.reduce(CycleAction::Interrupt, t0()).unwrap().is_none());
        assert!(history.reduce(CycleAction::Finish, t0()).unwrap().is_none());
    }

    #[test]
    fn interrupt_sets_only_interrupted_date() {
        let history = started("Write spec", 25);
        let at = t0() + Duration::seconds(42);
        let applied = history.reduce(CycleAction::Interrupt, at).unwrap().unwrap();
        let cycle = &applied.history.cycles()[0];
        assert_eq!(cycle.interrupted_date, Some(at));
        assert!(cycle.finished_date.is_none());
        assert!(applied.history.active_cycle_id().is_none());
        assert!(matches!(applied.event, Event::CycleInterrupted { .. }));
    }

    #[test]
    fn terminal_date_never_precedes_start() {
        let history = started("Skewed", 5);
        let applied = history
            .reduce(CycleAction::Finish, t0() - Duration::seconds(30))
            .unwrap()
            .unwrap();
        assert_eq!(applied.history.cycles()[0].finished_date, Some(t0()));
        assert!(applied.history.check_invariants().is_ok());
    }

    #[test]
    fn unchanged_entries_are_shared() {
        let mut history = started("One", 1);
        history = history.reduce(CycleAction::Finish, t0()).unwrap().unwrap().history;
        history = history
            .reduce(CycleAction::create("Two", 1), t0())
            .unwrap()
            .unwrap()
            .history;

        let next = history.reduce(CycleAction::Interrupt, t0()).unwrap().unwrap().history;
        assert!(Arc::ptr_eq(&history.cycles()[0], &next.cycles()[0]));
        assert!(!Arc::ptr_eq(&history.cycles()[1], &next.cycles()[1]));
    }

    #[test]
    fn suggestions_are_distinct_and_recent_first() {
        let mut history = CycleHistory::new();
        for task in ["Email", "Deep work", "Email", "Review"] {
            history = history
                .reduce(CycleAction::create(task, 5), t0())
                .unwrap()
                .unwrap()
                .history;
            history = history.reduce(CycleAction::Interrupt, t0()).unwrap().unwrap().history;
        }
        assert_eq!(history.task_suggestions(), vec!["Review", "Email", "Deep work"]);
    }

    #[test]
    fn invariant_check_flags_dangling_active_id() {
        let history = CycleHistory {
            cycles: Vec::new(),
            active_cycle_id: Some(CycleId::new()),
        };
        assert!(matches!(
            history.check_invariants(),
            Err(InvariantViolation::DanglingActiveId(_))
        ));
    }

    #[test]
    fn invariant_check_flags_terminal_active_cycle() {
        let id = CycleId::new();
        let cycle = Cycle::started(id, "x".into(), 1, t0()).with_finished(t0());
        let history = CycleHistory {
            cycles: vec![Arc::new(cycle)],
            active_cycle_id: Some(id),
        };
        assert_eq!(
            history.check_invariants(),
            Err(InvariantViolation::ActiveCycleTerminal(id))
        );
    }

    #[test]
    fn serializes_for_export_only() {
        let history = started("Write spec", 25);
        let id = history.active_cycle_id().unwrap();
        let json = serde_json::to_value(&history).unwrap();

        assert_eq!(json["active_cycle_id"], id.to_string());
        assert_eq!(json["cycles"][0]["task"], "Write spec");
        assert_eq!(json["cycles"][0]["duration_minutes"], 25);
    }
}
