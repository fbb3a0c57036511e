use std::fmt;

use serde::{Deserialize, Serialize};

/// Remaining time as shown to the user, derived from elapsed and total
/// seconds. Holds no state of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CountdownDisplay {
    pub total_seconds: u64,
    pub elapsed_seconds: u64,
}

impl CountdownDisplay {
    pub fn new(total_seconds: u64, elapsed_seconds: u64) -> Self {
        Self {
            total_seconds,
            elapsed_seconds,
        }
    }

    /// Display for when no cycle is active: `00:00`.
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.total_seconds.saturating_sub(self.elapsed_seconds)
    }

    pub fn minutes(&self) -> u64 {
        self.remaining_seconds() / 60
    }

    pub fn seconds(&self) -> u64 {
        self.remaining_seconds() % 60
    }

    /// 0.0 .. 1.0 progress through the cycle.
    pub fn progress(&self) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        (self.elapsed_seconds as f64 / self.total_seconds as f64).min(1.0)
    }
}

impl fmt::Display for CountdownDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes(), self.seconds())
    }
}
