//! Bulk ingestion of tabular stock uploads.
//!
//! Rows are parsed and summed per key on a pool of blocking workers that
//! share one concurrent map. Nothing is written until every worker has
//! finished and every row parsed; the totals then go to the ledger as a
//! single commit.

use crate::core::config::BatchConfig;
use crate::core::error::{InventoryError, Result};
use crate::core::model::add_quantity;
use crate::core::{StockDelta, StockKey};
use crate::inventory::Inventory;
use csv::StringRecord;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::join_all;
use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// A data row and its position in the upload (the header is row 0).
pub type NumberedRow = (usize, StringRecord);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// Data rows read, header excluded.
    pub rows: usize,
    /// Committed totals, one per key, ordered by key.
    pub records: Vec<StockDelta>,
}

pub struct BatchAggregator {
    inventory: Arc<Inventory>,
    workers: usize,
    timeout: Duration,
}

impl BatchAggregator {
    pub fn new(inventory: Arc<Inventory>, config: &BatchConfig) -> Self {
        Self {
            inventory,
            workers: config.workers.max(1),
            timeout: config.timeout(),
        }
    }

    /// Overrides the aggregation deadline taken from the configuration.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads a CSV upload (color, percentage, quantity; first row is a
    /// header), aggregates it and commits the totals.
    pub async fn ingest<R: Read>(&self, reader: R) -> Result<BatchSummary> {
        let rows = read_rows(reader)?;
        let row_count = rows.len();
        let records = self.aggregate(rows).await?;

        if records.is_empty() {
            info!("Batch contained no data rows");
        } else {
            self.inventory.commit_batch(&records).await?;
        }
        info!(rows = row_count, keys = records.len(), "Batch committed");
        Ok(BatchSummary {
            rows: row_count,
            records,
        })
    }

    /// Sums quantities per key across the worker pool.
    ///
    /// Fails with the lowest-numbered malformed row seen, or with
    /// [`InventoryError::Timeout`] if the workers do not finish in time.
    pub async fn aggregate(&self, rows: Vec<NumberedRow>) -> Result<Vec<StockDelta>> {
        let merged: Arc<DashMap<StockKey, StockDelta>> = Arc::new(DashMap::new());
        // Lowest malformed row seen so far; rows above it need not be parsed.
        let first_failure = Arc::new(AtomicUsize::new(usize::MAX));

        let partitions = partition(rows, self.workers);
        debug!(partitions = partitions.len(), "Dispatching batch rows");

        let handles: Vec<JoinHandle<Result<()>>> = partitions
            .into_iter()
            .map(|rows| {
                let merged = Arc::clone(&merged);
                let first_failure = Arc::clone(&first_failure);
                tokio::task::spawn_blocking(move || merge_partition(rows, &merged, &first_failure))
            })
            .collect();
        let abort_handles: Vec<_> = handles.iter().map(|h| h.abort_handle()).collect();

        let results = match timeout(self.timeout, join_all(handles)).await {
            Ok(results) => results,
            Err(_) => {
                warn!(timeout = ?self.timeout, "Batch workers timed out");
                first_failure.store(0, Ordering::SeqCst);
                for handle in abort_handles {
                    handle.abort();
                }
                return Err(InventoryError::Timeout(self.timeout));
            }
        };

        let mut failure: Option<InventoryError> = None;
        for result in results {
            if let Err(e) = result? {
                failure = Some(match failure {
                    Some(current) => earliest(current, e),
                    None => e,
                });
            }
        }
        if let Some(e) = failure {
            warn!(error = %e, "Batch rejected");
            return Err(e);
        }

        let mut records: Vec<StockDelta> = merged.iter().map(|e| e.value().clone()).collect();
        records.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(records)
    }
}

fn read_rows<R: Read>(reader: R) -> Result<Vec<NumberedRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    reader
        .records()
        .enumerate()
        .map(|(index, record)| {
            let row = index + 1;
            record
                .map(|r| (row, r))
                .map_err(|e| InventoryError::malformed(row, e.to_string()))
        })
        .collect()
}

/// Splits rows into at most `workers` contiguous partitions.
fn partition(mut rows: Vec<NumberedRow>, workers: usize) -> Vec<Vec<NumberedRow>> {
    let size = rows.len().div_ceil(workers).max(1);
    let mut partitions = Vec::with_capacity(workers);
    while rows.len() > size {
        let tail = rows.split_off(size);
        partitions.push(std::mem::replace(&mut rows, tail));
    }
    if !rows.is_empty() {
        partitions.push(rows);
    }
    partitions
}

fn merge_partition(
    rows: Vec<NumberedRow>,
    merged: &DashMap<StockKey, StockDelta>,
    first_failure: &AtomicUsize,
) -> Result<()> {
    // Partitions are contiguous and ascending, so once a row lies past the
    // earliest failure so far, so does the rest of the partition.
    for (row, record) in rows {
        if row > first_failure.load(Ordering::SeqCst) {
            return Ok(());
        }
        if let Err(e) = parse_row(row, &record).and_then(|delta| merge(merged, row, delta)) {
            first_failure.fetch_min(row, Ordering::SeqCst);
            return Err(e);
        }
    }
    Ok(())
}

/// Adds the row into the running total for its key in one entry operation.
fn merge(merged: &DashMap<StockKey, StockDelta>, row: usize, delta: StockDelta) -> Result<()> {
    match merged.entry(delta.key.clone()) {
        Entry::Occupied(mut entry) => {
            let total = entry.get_mut();
            total.quantity = add_quantity(total.quantity, delta.quantity)
                .map_err(|_| InventoryError::malformed(row, "quantity overflow"))?;
        }
        Entry::Vacant(entry) => {
            entry.insert(delta);
        }
    }
    Ok(())
}

fn parse_row(row: usize, record: &StringRecord) -> Result<StockDelta> {
    let color = cell(row, record, 0, "color")?;
    let percentage = whole_number(row, cell(row, record, 1, "percentage")?, "percentage")?;
    let quantity = whole_number(row, cell(row, record, 2, "quantity")?, "quantity")?;

    let percentage = u8::try_from(percentage)
        .map_err(|_| InventoryError::malformed(row, format!("percentage out of range: {percentage}")))?;
    StockDelta::new(color, percentage, quantity).map_err(|e| InventoryError::malformed(row, e.to_string()))
}

fn cell<'a>(row: usize, record: &'a StringRecord, index: usize, name: &str) -> Result<&'a str> {
    match record.get(index) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(InventoryError::malformed(row, format!("missing {name}"))),
    }
}

/// Accepts integers and integral floats such as spreadsheet exports write them.
fn whole_number(row: usize, value: &str, name: &str) -> Result<u64> {
    if let Ok(n) = value.parse::<u64>() {
        return Ok(n);
    }
    match value.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64 => Ok(f as u64),
        _ => Err(InventoryError::malformed(
            row,
            format!("{name} is not a whole number: {value:?}"),
        )),
    }
}

fn earliest(a: InventoryError, b: InventoryError) -> InventoryError {
    match (&a, &b) {
        (
            InventoryError::MalformedInput { row: ra, .. },
            InventoryError::MalformedInput { row: rb, .. },
        ) if rb < ra => b,
        _ => a,
    }
}
