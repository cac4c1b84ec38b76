pub mod disk;
pub mod locks;
pub mod memory;

use crate::core::StockLedger;
use crate::core::config::{AppConfig, StorageKind};
use anyhow::{Context, Result};
use disk::DiskLedger;
use memory::MemoryLedger;
use std::sync::Arc;
use tracing::debug;

/// Opens the ledger selected by the configuration.
pub fn open_ledger(config: &AppConfig) -> Result<Arc<dyn StockLedger>> {
    match config.storage {
        StorageKind::Memory => {
            debug!("Using in-memory ledger");
            Ok(Arc::new(MemoryLedger::new()))
        }
        StorageKind::Disk => {
            let path = config.default_data_path()?.join("ledger");
            debug!("Using disk ledger at {}", path.display());
            let ledger = DiskLedger::open(&path)
                .with_context(|| format!("Failed to open ledger at {}", path.display()))?;
            Ok(Arc::new(ledger))
        }
    }
}
