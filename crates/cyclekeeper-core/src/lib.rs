//! # cyclekeeper Core Library
//!
//! Business logic for a single-focus work timer: the user names a task, picks
//! a duration, and one work cycle is tracked from start to a terminal outcome
//! while a live countdown is displayed.
//!
//! ## Architecture
//!
//! - **Cycle Store**: append-only history of cycles with at most one active
//!   cycle; every transition goes through a closed [`CycleAction`] set
//! - **Countdown Engine**: wall-clock sampler that re-derives elapsed time on
//!   every tick, so scheduling jitter never accumulates
//! - **Session**: composition root that routes engine completion into the
//!   store's finish transition
//! - **Driver**: tokio-based 1 Hz trigger, held only while a cycle is sampled
//!
//! ## Key Components
//!
//! - [`CycleStore`]: single source of truth for cycle state
//! - [`CountdownEngine`]: drift-corrected countdown
//! - [`CycleSession`]: store + engine + clock
//! - [`Config`]: application configuration management

pub mod clock;
pub mod config;
pub mod countdown;
pub mod cycle;
pub mod error;
pub mod events;
pub mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use countdown::{CountdownDisplay, CountdownDriver, CountdownEngine, DriverCommand, DriverOutcome, Sample};
pub use cycle::{Cycle, CycleAction, CycleHistory, CycleId, CycleStatus, CycleStore, InvariantViolation};
pub use error::{ConfigError, CoreError, CycleError, ValidationError};
pub use events::Event;
pub use session::{CycleSession, StartedCycle};
