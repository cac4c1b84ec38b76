pub mod batch;
pub mod cli;
pub mod core;
pub mod inventory;
pub mod query;
pub mod store;

use crate::batch::BatchAggregator;
use crate::core::config::AppConfig;
use crate::inventory::Inventory;
use crate::query::StockFilter;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// A command accepted by [`run_command`].
#[derive(Debug, Clone)]
pub enum AppCommand {
    Income {
        color: String,
        percentage: u8,
        quantity: u64,
    },
    Outcome {
        color: String,
        percentage: u8,
        quantity: u64,
    },
    Update {
        id: u64,
        color: String,
        percentage: u8,
        quantity: u64,
    },
    List {
        filter: StockFilter,
        json: bool,
    },
    Batch {
        file: PathBuf,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Socks inventory starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let ledger = store::open_ledger(&config)?;
    let inventory = Arc::new(Inventory::new(ledger));

    match command {
        AppCommand::Income {
            color,
            percentage,
            quantity,
        } => cli::stock::income(&inventory, &color, percentage, quantity).await,
        AppCommand::Outcome {
            color,
            percentage,
            quantity,
        } => cli::stock::outcome(&inventory, &color, percentage, quantity).await,
        AppCommand::Update {
            id,
            color,
            percentage,
            quantity,
        } => cli::stock::update(&inventory, id, &color, percentage, quantity).await,
        AppCommand::List { filter, json } => cli::list::run(&inventory, &filter, json).await,
        AppCommand::Batch { file } => {
            let aggregator = BatchAggregator::new(Arc::clone(&inventory), &config.batch);
            cli::batch::run(&aggregator, &file).await
        }
    }
}
