use clap::{Parser, Subcommand};
use cyclekeeper_core::Config;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "cyclekeeper", version, about = "Single-focus work cycle timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one work cycle in the foreground (Ctrl-C interrupts)
    Start(commands::start::StartArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default();
    logging::init(&config.logging.filter);

    let result = match cli.command {
        Commands::Start(args) => commands::start::run(args, &config),
        Commands::Config { action } => commands::config::run(action).map_err(Into::into),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
