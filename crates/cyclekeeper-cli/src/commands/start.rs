use std::io::{IsTerminal, Write};

use clap::Args;
use cyclekeeper_core::countdown::CountdownDisplay;
use cyclekeeper_core::error::Result;
use cyclekeeper_core::{Config, CountdownDriver, Cycle, CycleSession, DriverCommand, DriverOutcome, Event};
use tokio::sync::mpsc;

const BAR_WIDTH: usize = 20;

#[derive(Args)]
pub struct StartArgs {
    /// Task to focus on
    task: String,
    /// Cycle length in minutes (defaults to countdown.default_minutes)
    #[arg(short, long)]
    minutes: Option<u32>,
    /// Print events as JSON lines instead of a live countdown
    #[arg(long)]
    json: bool,
}

pub fn run(args: StartArgs, config: &Config) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let minutes = config
        .countdown
        .check_minutes(args.minutes.unwrap_or(config.countdown.default_minutes))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_cycle(args, minutes, config))?;
    Ok(())
}

async fn run_cycle(args: StartArgs, minutes: u32, config: &Config) -> Result<()> {
    let mut session = CycleSession::new();
    let started = session.start_cycle(args.task, minutes)?;

    let (tx, mut rx) = mpsc::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(DriverCommand::Interrupt).await;
        }
    });

    let stdout = std::io::stdout();
    let mut renderer = Renderer {
        set_title: config.display.set_terminal_title && stdout.is_terminal(),
        out: stdout,
        json: args.json,
        total_seconds: u64::from(minutes) * 60,
    };
    for event in &started.events {
        renderer.event(event);
    }

    let outcome = CountdownDriver::new(config.countdown.tick_interval())
        .run(&mut session, &mut rx, |event| renderer.event(event))
        .await;
    tracing::debug!(?outcome, "countdown ended");

    renderer.finish(outcome);
    if let Some(cycle) = session.history().get(started.id) {
        renderer.record(cycle)?;
    }
    Ok(())
}

/// Writes cycle progress either as a live `MM:SS` line or as JSON lines.
struct Renderer<W: Write> {
    out: W,
    json: bool,
    set_title: bool,
    total_seconds: u64,
}

impl<W: Write> Renderer<W> {
    fn event(&mut self, event: &Event) {
        if self.json {
            match serde_json::to_string(event) {
                Ok(line) => {
                    let _ = writeln!(self.out, "{line}");
                }
                Err(e) => tracing::warn!(error = %e, "failed to serialize event"),
            }
            return;
        }
        match event {
            Event::CycleStarted { task, .. } => {
                let _ = writeln!(self.out, "{task}");
            }
            Event::CountdownTick {
                elapsed_seconds, ..
            } => self.countdown(CountdownDisplay::new(self.total_seconds, *elapsed_seconds)),
            _ => {}
        }
    }

    fn countdown(&mut self, display: CountdownDisplay) {
        if self.set_title {
            let _ = write!(self.out, "\x1b]0;{display}\x07");
        }
        let _ = write!(self.out, "\r{display} {}", progress_bar(display.progress()));
        let _ = self.out.flush();
    }

    fn finish(&mut self, outcome: DriverOutcome) {
        if self.json {
            return;
        }
        if matches!(outcome, DriverOutcome::Finished(_)) {
            self.countdown(CountdownDisplay::new(self.total_seconds, self.total_seconds));
        }
        if self.set_title {
            let _ = write!(self.out, "\x1b]0;\x07");
        }
        let _ = match outcome {
            DriverOutcome::Finished(_) => writeln!(self.out, "\ncycle finished"),
            DriverOutcome::Interrupted(_) => writeln!(self.out, "\ncycle interrupted"),
            DriverOutcome::Stopped(_) | DriverOutcome::Idle => writeln!(self.out),
        };
    }

    fn record(&mut self, cycle: &Cycle) -> Result<()> {
        let record = if self.json {
            serde_json::to_string(cycle)?
        } else {
            serde_json::to_string_pretty(cycle)?
        };
        let _ = writeln!(self.out, "{record}");
        Ok(())
    }
}

fn progress_bar(progress: f64) -> String {
    let filled = ((progress * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}
