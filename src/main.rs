use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use drip::core::log::init_logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for drip::AppCommand {
    fn from(cmd: Commands) -> drip::AppCommand {
        match cmd {
            Commands::Plan => drip::AppCommand::Plan,
            Commands::Prices => drip::AppCommand::Prices,
            Commands::Crash => drip::AppCommand::Crash,
            Commands::Record { notes } => drip::AppCommand::Record { notes },
            Commands::History { limit } => drip::AppCommand::History { limit },
            Commands::Returns => drip::AppCommand::Returns,
            Commands::Export { output } => drip::AppCommand::Export { output },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display this week's purchase plan
    Plan,
    /// Display current prices for the configured basket
    Prices,
    /// Check for crash buying opportunities
    Crash,
    /// Compute this week's plan and record it in the history
    Record {
        /// Free-form note attached to every recorded purchase
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Display recent purchases and cadence statistics
    History {
        /// Number of records to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Display cost basis against current prices
    Returns,
    /// Export the purchase history as CSV
    Export {
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => drip::cli::setup::setup(),
        Some(cmd) => drip::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
