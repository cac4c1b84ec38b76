use super::locks::KeyLocks;
use crate::core::error::Result;
use crate::core::model::add_quantity;
use crate::core::{Criteria, SortField, StockDelta, StockKey, StockLedger, StockRecord};
use async_trait::async_trait;
use fjall::{Batch, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

const RECORDS_PARTITION: &str = "socks";
const IDS_PARTITION: &str = "sock_ids";

/// Durable ledger on a fjall keyspace.
///
/// `socks` maps the JSON-encoded key to the JSON-encoded record and
/// `sock_ids` maps the big-endian id to the encoded key. Each operation
/// commits through a single write batch.
pub struct DiskLedger {
    keyspace: Keyspace,
    records: PartitionHandle,
    ids: PartitionHandle,
    next_id: AtomicU64,
    locks: KeyLocks,
    gate: RwLock<()>,
}

fn encode_key(key: &StockKey) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(key)?)
}

fn encode_id(id: u64) -> Vec<u8> {
    id.to_be_bytes().to_vec()
}

impl DiskLedger {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;

        let keyspace = fjall::Config::new(path).open()?;
        let records = keyspace.open_partition(RECORDS_PARTITION, PartitionCreateOptions::default())?;
        let ids = keyspace.open_partition(IDS_PARTITION, PartitionCreateOptions::default())?;

        // Records are never deleted, so the highest stored id bounds every id
        // ever handed out.
        let mut max_id = 0;
        for item in records.iter() {
            let (_, value) = item?;
            let record: StockRecord = serde_json::from_slice(&value)?;
            max_id = max_id.max(record.id);
        }
        debug!(path = %path.display(), max_id, "Opened disk ledger");

        Ok(Self {
            keyspace,
            records,
            ids,
            next_id: AtomicU64::new(max_id + 1),
            locks: KeyLocks::new(),
            gate: RwLock::new(()),
        })
    }

    fn read(&self, encoded: &[u8]) -> Result<Option<StockRecord>> {
        match self.records.get(encoded)? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    fn commit(&self, batch: Batch) -> Result<()> {
        batch.commit()?;
        self.keyspace.persist(PersistMode::SyncData)?;
        Ok(())
    }

    fn new_record(&self, key: &StockKey, quantity: u64) -> StockRecord {
        StockRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            color: key.color.clone(),
            percentage: key.percentage,
            quantity,
        }
    }
}

#[async_trait]
impl StockLedger for DiskLedger {
    async fn upsert_add(&self, delta: &StockDelta) -> Result<StockRecord> {
        let _shared = self.gate.read().await;
        let _key_guard = self.locks.lock(&delta.key).await;

        let encoded = encode_key(&delta.key)?;
        let mut batch = self.keyspace.batch();
        let record = match self.read(&encoded)? {
            Some(mut record) => {
                record.quantity = add_quantity(record.quantity, delta.quantity)?;
                record
            }
            None => {
                let record = self.new_record(&delta.key, delta.quantity);
                batch.insert(&self.ids, encode_id(record.id), encoded.clone());
                debug!(id = record.id, key = %delta.key, "Created stock record");
                record
            }
        };
        batch.insert(&self.records, encoded, serde_json::to_vec(&record)?);
        self.commit(batch)?;
        Ok(record)
    }

    async fn conditional_subtract(&self, delta: &StockDelta) -> Result<usize> {
        let _shared = self.gate.read().await;
        let _key_guard = self.locks.lock(&delta.key).await;

        let encoded = encode_key(&delta.key)?;
        let mut record = match self.read(&encoded)? {
            Some(record) if record.quantity >= delta.quantity => record,
            _ => return Ok(0),
        };
        record.quantity -= delta.quantity;

        let mut batch = self.keyspace.batch();
        batch.insert(&self.records, encoded, serde_json::to_vec(&record)?);
        self.commit(batch)?;
        Ok(1)
    }

    async fn conditional_update(&self, id: u64, key: &StockKey, quantity: u64) -> Result<usize> {
        let _exclusive = self.gate.write().await;

        let Some(current) = self.ids.get(encode_id(id))? else {
            return Ok(0);
        };
        let Some(mut record) = self.read(&current)? else {
            return Ok(0);
        };
        let target = encode_key(key)?;
        let rekeyed = !record.matches(key);
        if rekeyed && self.read(&target)?.is_some() {
            return Ok(0);
        }

        record.color = key.color.clone();
        record.percentage = key.percentage;
        record.quantity = quantity;

        let mut batch = self.keyspace.batch();
        if rekeyed {
            batch.remove(&self.records, current.to_vec());
            batch.insert(&self.ids, encode_id(id), target.clone());
        }
        batch.insert(&self.records, target, serde_json::to_vec(&record)?);
        self.commit(batch)?;
        Ok(1)
    }

    async fn find(&self, criteria: &Criteria, sort: Option<SortField>) -> Result<Vec<StockRecord>> {
        let _shared = self.gate.read().await;

        let mut records = Vec::new();
        for item in self.records.iter() {
            let (_, value) = item?;
            records.push(serde_json::from_slice::<StockRecord>(&value)?);
        }
        records.sort_by_key(|r| r.id);
        Ok(criteria.arrange(records, sort))
    }

    async fn save_all(&self, records: &[StockDelta]) -> Result<()> {
        let _exclusive = self.gate.write().await;

        let mut staged: HashMap<Vec<u8>, StockRecord> = HashMap::new();
        let mut batch = self.keyspace.batch();
        for delta in records {
            let encoded = encode_key(&delta.key)?;
            let existing = match staged.remove(&encoded) {
                Some(record) => Some(record),
                None => self.read(&encoded)?,
            };
            let record = match existing {
                Some(mut record) => {
                    record.quantity = add_quantity(record.quantity, delta.quantity)?;
                    record
                }
                None => {
                    let record = self.new_record(&delta.key, delta.quantity);
                    batch.insert(&self.ids, encode_id(record.id), encoded.clone());
                    record
                }
            };
            staged.insert(encoded, record);
        }

        for (encoded, record) in &staged {
            batch.insert(&self.records, encoded.clone(), serde_json::to_vec(record)?);
        }
        self.commit(batch)?;
        debug!(count = staged.len(), "Committed batch to disk ledger");
        Ok(())
    }
}
