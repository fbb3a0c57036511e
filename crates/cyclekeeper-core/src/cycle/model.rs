use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque cycle identifier.
///
/// Random v4 UUIDs, so two cycles created within the same millisecond
/// still get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CycleId(Uuid);

impl CycleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CycleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Where a cycle is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    InProgress,
    Interrupted,
    Finished,
}

impl fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CycleStatus::InProgress => "in progress",
            CycleStatus::Interrupted => "interrupted",
            CycleStatus::Finished => "finished",
        };
        f.write_str(label)
    }
}

/// One work session.
///
/// `id`, `task`, `duration_minutes` and `start_date` are fixed at creation.
/// At most one of the terminal timestamps is ever set, and only once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    pub id: CycleId,
    pub task: String,
    pub duration_minutes: u32,
    pub start_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interrupted_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_date: Option<DateTime<Utc>>,
}

impl Cycle {
    pub(crate) fn started(
        id: CycleId,
        task: String,
        duration_minutes: u32,
        start_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            task,
            duration_minutes,
            start_date,
            interrupted_date: None,
            finished_date: None,
        }
    }

    pub fn status(&self) -> CycleStatus {
        if self.finished_date.is_some() {
            CycleStatus::Finished
        } else if self.interrupted_date.is_some() {
            CycleStatus::Interrupted
        } else {
            CycleStatus::InProgress
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.interrupted_date.is_some() || self.finished_date.is_some()
    }

    /// Target duration in seconds.
    pub fn total_seconds(&self) -> u64 {
        u64::from(self.duration_minutes) * 60
    }

    /// Timestamp of whichever terminal transition happened, if any.
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.finished_date.or(self.interrupted_date)
    }

    pub(crate) fn with_interrupted(&self, at: DateTime<Utc>) -> Self {
        Self {
            interrupted_date: Some(at),
            ..self.clone()
        }
    }

    pub(crate) fn with_finished(&self, at: DateTime<Utc>) -> Self {
        Self {
            finished_date: Some(at),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle() -> Cycle {
        Cycle::started(CycleId::new(), "Write docs".into(), 25, Utc::now())
    }

    #[test]
    fn status_follows_terminal_dates() {
        let c = cycle();
        assert_eq!(c.status(), CycleStatus::InProgress);
        assert!(!c.is_terminal());

        let interrupted = c.with_interrupted(Utc::now());
        assert_eq!(interrupted.status(), CycleStatus::Interrupted);
        assert!(interrupted.is_terminal());

        let finished = c.with_finished(Utc::now());
        assert_eq!(finished.status(), CycleStatus::Finished);
        assert_eq!(finished.ended_at(), finished.finished_date);
    }

    #[test]
    fn total_seconds_converts_minutes() {
        assert_eq!(cycle().total_seconds(), 1500);
    }

    #[test]
    fn ids_are_unique() {
        let ids: std::collections::HashSet<CycleId> = (0..1000).map(|_| CycleId::new()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn serializes_without_absent_terminal_dates() {
        let json = serde_json::to_value(cycle()).unwrap();
        assert!(json.get("interrupted_date").is_none());
        assert!(json.get("finished_date").is_none());
        assert_eq!(json["duration_minutes"], 25);
    }
}
