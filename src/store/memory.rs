use crate::core::error::Result;
use crate::core::model::add_quantity;
use crate::core::{Criteria, SortField, StockDelta, StockKey, StockLedger, StockRecord};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

/// In-process ledger.
///
/// Income and outcome run inside the shard lock of their key's entry, so they
/// are atomic per key without blocking other keys. Updates that move a record
/// to a new key, and bulk commits, take the gate exclusively.
pub struct MemoryLedger {
    rows: DashMap<StockKey, StockRecord>,
    ids: DashMap<u64, StockKey>,
    next_id: AtomicU64,
    gate: RwLock<()>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
            ids: DashMap::new(),
            next_id: AtomicU64::new(1),
            gate: RwLock::new(()),
        }
    }

    fn add(&self, key: &StockKey, quantity: u64) -> Result<StockRecord> {
        match self.rows.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                let record = entry.get_mut();
                record.quantity = add_quantity(record.quantity, quantity)?;
                Ok(record.clone())
            }
            Entry::Vacant(entry) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                let record = StockRecord {
                    id,
                    color: key.color.clone(),
                    percentage: key.percentage,
                    quantity,
                };
                self.ids.insert(id, key.clone());
                entry.insert(record.clone());
                debug!(id, %key, "Created stock record");
                Ok(record)
            }
        }
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StockLedger for MemoryLedger {
    async fn upsert_add(&self, delta: &StockDelta) -> Result<StockRecord> {
        let _shared = self.gate.read().await;
        self.add(&delta.key, delta.quantity)
    }

    async fn conditional_subtract(&self, delta: &StockDelta) -> Result<usize> {
        let _shared = self.gate.read().await;
        match self.rows.get_mut(&delta.key) {
            Some(mut record) if record.quantity >= delta.quantity => {
                record.quantity -= delta.quantity;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn conditional_update(&self, id: u64, key: &StockKey, quantity: u64) -> Result<usize> {
        let _exclusive = self.gate.write().await;
        let Some(current) = self.ids.get(&id).map(|k| k.value().clone()) else {
            return Ok(0);
        };
        if current != *key && self.rows.contains_key(key) {
            return Ok(0);
        }
        let Some((_, mut record)) = self.rows.remove(&current) else {
            return Ok(0);
        };
        record.color = key.color.clone();
        record.percentage = key.percentage;
        record.quantity = quantity;
        self.rows.insert(key.clone(), record);
        self.ids.insert(id, key.clone());
        Ok(1)
    }

    async fn find(&self, criteria: &Criteria, sort: Option<SortField>) -> Result<Vec<StockRecord>> {
        let _shared = self.gate.read().await;
        let mut records: Vec<StockRecord> = self.rows.iter().map(|r| r.value().clone()).collect();
        records.sort_by_key(|r| r.id);
        Ok(criteria.arrange(records, sort))
    }

    async fn save_all(&self, records: &[StockDelta]) -> Result<()> {
        let _exclusive = self.gate.write().await;

        // Reject the whole commit before touching any row.
        let mut planned: HashMap<&StockKey, u64> = HashMap::new();
        for delta in records {
            let current = match planned.get(&delta.key) {
                Some(total) => *total,
                None => self.rows.get(&delta.key).map_or(0, |r| r.quantity),
            };
            planned.insert(&delta.key, add_quantity(current, delta.quantity)?);
        }

        for delta in records {
            self.add(&delta.key, delta.quantity)?;
        }
        debug!(count = records.len(), "Committed batch to memory ledger");
        Ok(())
    }
}
