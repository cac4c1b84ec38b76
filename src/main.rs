use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use socks::core::log::init_logging;
use socks::query::StockFilter;
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

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Register incoming socks
    Income {
        color: String,
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percentage: u8,
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        quantity: u64,
    },
    /// Register outgoing socks
    Outcome {
        color: String,
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percentage: u8,
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        quantity: u64,
    },
    /// Replace color, percentage and quantity of a record
    Update {
        id: u64,
        color: String,
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percentage: u8,
        quantity: u64,
    },
    /// List socks with optional filters
    List {
        #[arg(long)]
        color: Option<String>,
        /// One of moreThan, lessThan, equal (used with --percentage)
        #[arg(long)]
        operation: Option<String>,
        /// Threshold for --operation, or lower bound with --max-percentage
        #[arg(long)]
        percentage: Option<u8>,
        #[arg(long)]
        max_percentage: Option<u8>,
        /// Sort by color or percentage
        #[arg(long)]
        sort_by: Option<String>,
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Upload a CSV batch (color, percentage, quantity; first row is a header)
    Batch { file: PathBuf },
}

impl From<Commands> for socks::AppCommand {
    fn from(cmd: Commands) -> socks::AppCommand {
        match cmd {
            Commands::Income {
                color,
                percentage,
                quantity,
            } => socks::AppCommand::Income {
                color,
                percentage,
                quantity,
            },
            Commands::Outcome {
                color,
                percentage,
                quantity,
            } => socks::AppCommand::Outcome {
                color,
                percentage,
                quantity,
            },
            Commands::Update {
                id,
                color,
                percentage,
                quantity,
            } => socks::AppCommand::Update {
                id,
                color,
                percentage,
                quantity,
            },
            Commands::List {
                color,
                operation,
                percentage,
                max_percentage,
                sort_by,
                json,
            } => socks::AppCommand::List {
                filter: StockFilter {
                    color,
                    operation,
                    percentage,
                    max_percentage,
                    sort_by,
                },
                json,
            },
            Commands::Batch { file } => socks::AppCommand::Batch { file },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => socks::cli::setup::setup(),
        Some(cmd) => socks::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
