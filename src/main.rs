use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tickerdash::core::log::init_logging;

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

impl From<Commands> for tickerdash::AppCommand {
    fn from(cmd: Commands) -> tickerdash::AppCommand {
        match cmd {
            Commands::Companies { json } => tickerdash::AppCommand::Companies { json },
            Commands::Chart { ticker } => tickerdash::AppCommand::Chart { ticker },
            Commands::Countries => tickerdash::AppCommand::Countries,
            Commands::Prices => tickerdash::AppCommand::Prices,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display the companies table
    Companies {
        /// Print the table as JSON
        #[arg(long)]
        json: bool,
    },
    /// Chart the closing prices of one ticker
    Chart {
        /// Ticker symbol, matched case-insensitively
        ticker: Option<String>,
    },
    /// Display market cap statistics by country
    Countries,
    /// Display the most recent closes of every ticker
    Prices,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => tickerdash::cli::setup::setup(),
        Some(cmd) => tickerdash::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
