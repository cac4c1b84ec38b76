//! Stock mutations against a shared ledger.
//!
//! Every operation maps onto one atomic ledger primitive; nothing here reads a
//! quantity and writes it back in a separate step.

use crate::core::error::{InventoryError, Result};
use crate::core::{StockDelta, StockKey, StockLedger, StockRecord};
use crate::query::{self, StockFilter};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct Inventory {
    ledger: Arc<dyn StockLedger>,
}

impl Inventory {
    pub fn new(ledger: Arc<dyn StockLedger>) -> Self {
        Self { ledger }
    }

    /// Adds stock for the key, creating the record on first income.
    #[instrument(name = "Income", skip(self, delta), fields(key = %delta.key, quantity = delta.quantity))]
    pub async fn register_income(&self, delta: &StockDelta) -> Result<StockRecord> {
        let delta = normalize(delta)?;
        let record = self.ledger.upsert_add(&delta).await?;
        info!(id = record.id, total = record.quantity, "Income registered");
        Ok(record)
    }

    /// Removes stock only when enough is available; otherwise nothing changes.
    #[instrument(name = "Outcome", skip(self, delta), fields(key = %delta.key, quantity = delta.quantity))]
    pub async fn register_outcome(&self, delta: &StockDelta) -> Result<()> {
        let delta = normalize(delta)?;
        if self.ledger.conditional_subtract(&delta).await? == 0 {
            warn!("Outcome rejected, insufficient stock");
            return Err(InventoryError::InsufficientStock);
        }
        info!("Outcome registered");
        Ok(())
    }

    /// Replaces key and quantity of record `id`.
    ///
    /// A missing record and a key already owned by another record both yield
    /// [`InventoryError::Conflict`].
    #[instrument(name = "Update", skip(self, key), fields(key = %key))]
    pub async fn update_record(&self, id: u64, key: &StockKey, quantity: u64) -> Result<()> {
        let key = StockKey::new(&key.color, key.percentage)?;
        if self.ledger.conditional_update(id, &key, quantity).await? == 0 {
            warn!("Update rejected");
            return Err(InventoryError::Conflict);
        }
        info!("Record updated");
        Ok(())
    }

    pub async fn query(&self, filter: &StockFilter) -> Result<Vec<StockRecord>> {
        query::select(self.ledger.as_ref(), filter).await
    }

    /// Writes already-aggregated batch totals in one ledger commit.
    pub async fn commit_batch(&self, records: &[StockDelta]) -> Result<()> {
        let records = records.iter().map(normalize).collect::<Result<Vec<_>>>()?;
        debug!(count = records.len(), "Committing batch");
        self.ledger.save_all(&records).await
    }
}

fn normalize(delta: &StockDelta) -> Result<StockDelta> {
    StockDelta::new(&delta.key.color, delta.key.percentage, delta.quantity)
}
