//! Periodic trigger for a [`CycleSession`].
//!
//! The driver owns the tokio interval for exactly as long as the session is
//! sampling. The interval lives on the stack of [`CountdownDriver::run`], so
//! every way out of the loop drops it.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::cycle::CycleId;
use crate::events::Event;
use crate::session::CycleSession;

/// External requests accepted while a cycle is being sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverCommand {
    /// End the active cycle as interrupted.
    Interrupt,
    /// Stop sampling, leaving the cycle active.
    Stop,
}

/// Why [`CountdownDriver::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverOutcome {
    /// No cycle was active when the driver started.
    Idle,
    Finished(CycleId),
    Interrupted(CycleId),
    Stopped(CycleId),
}

const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy)]
pub struct CountdownDriver {
    period: Duration,
}

impl Default for CountdownDriver {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl CountdownDriver {
    /// A zero period is raised to one millisecond.
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(MIN_PERIOD),
        }
    }

    /// Sample the active cycle of `session` every period until it ends or a
    /// command stops the loop. A session whose sampling was stopped earlier
    /// is resumed. Every event produced is passed to `on_event`.
    ///
    /// Ticks are polled before commands, so a completion that is due on the
    /// same turn as an interrupt wins.
    pub async fn run<F>(
        &self,
        session: &mut CycleSession,
        commands: &mut mpsc::Receiver<DriverCommand>,
        mut on_event: F,
    ) -> DriverOutcome
    where
        F: FnMut(&Event),
    {
        let Some(cycle_id) = session.active_cycle().map(|c| c.id) else {
            return DriverOutcome::Idle;
        };

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut commands_open = true;
        debug!(%cycle_id, period_ms = self.period.as_millis() as u64, "countdown trigger acquired");

        let outcome = loop {
            tokio::select! {
                biased;

                _ = ticker.tick() => {
                    match session.tick() {
                        Some(event) => {
                            on_event(&event);
                            if event.is_terminal() {
                                break DriverOutcome::Finished(cycle_id);
                            }
                        }
                        None => break DriverOutcome::Stopped(cycle_id),
                    }
                }
                command = commands.recv(), if commands_open => {
                    match command {
                        Some(DriverCommand::Interrupt) => {
                            let event = session.interrupt();
                            if let Some(event) = &event {
                                on_event(event);
                            }
                            break match event {
                                Some(Event::CycleFinished { .. }) => DriverOutcome::Finished(cycle_id),
                                Some(_) => DriverOutcome::Interrupted(cycle_id),
                                None => DriverOutcome::Stopped(cycle_id),
                            };
                        }
                        Some(DriverCommand::Stop) => {
                            session.stop_sampling();
                            break DriverOutcome::Stopped(cycle_id);
                        }
                        None => commands_open = false,
                    }
                }
            }
        };

        drop(ticker);
        debug!(%cycle_id, ?outcome, "countdown trigger released");
        outcome
    }
}
