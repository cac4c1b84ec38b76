//! Storage contract required by the inventory core.

use crate::core::error::{InventoryError, Result};
use crate::core::model::{StockDelta, StockKey, StockRecord};
use async_trait::async_trait;
use std::str::FromStr;

/// Selection applied by [`StockLedger::find`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criteria {
    All,
    PercentageAbove(u8),
    PercentageBelow(u8),
    PercentageEqual(u8),
    /// Inclusive on both ends.
    PercentageBetween(u8, u8),
    /// Always ordered by percentage ascending.
    Color(String),
}

impl Criteria {
    pub fn matches(&self, record: &StockRecord) -> bool {
        match self {
            Criteria::All => true,
            Criteria::PercentageAbove(p) => record.percentage > *p,
            Criteria::PercentageBelow(p) => record.percentage < *p,
            Criteria::PercentageEqual(p) => record.percentage == *p,
            Criteria::PercentageBetween(min, max) => {
                record.percentage >= *min && record.percentage <= *max
            }
            Criteria::Color(color) => record.color == *color,
        }
    }

    /// Filters and orders records read from a ledger.
    ///
    /// Input is expected in id order; that order is kept when no sort applies.
    pub fn arrange(&self, records: Vec<StockRecord>, sort: Option<SortField>) -> Vec<StockRecord> {
        let mut selected: Vec<_> = records.into_iter().filter(|r| self.matches(r)).collect();
        let sort = match self {
            Criteria::Color(_) => Some(SortField::Percentage),
            _ => sort,
        };
        match sort {
            Some(SortField::Color) => selected.sort_by(|a, b| a.color.cmp(&b.color)),
            Some(SortField::Percentage) => selected.sort_by_key(|r| r.percentage),
            None => {}
        }
        selected
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Color,
    Percentage,
}

impl FromStr for SortField {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "color" => Ok(SortField::Color),
            "percentage" | "cottoncontent" => Ok(SortField::Percentage),
            _ => Err(InventoryError::invalid(format!("Invalid sorting type: {s}"))),
        }
    }
}

/// Durable collection of stock records.
///
/// Every mutating method is a single indivisible step with respect to other
/// callers touching the same key: implementations must never expose the gap
/// between reading a quantity and writing the new one.
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Adds `delta.quantity` to the record for the key, creating it if absent.
    async fn upsert_add(&self, delta: &StockDelta) -> Result<StockRecord>;

    /// Subtracts `delta.quantity` only when the record exists and holds at
    /// least that much. Returns the number of rows changed (0 or 1).
    async fn conditional_subtract(&self, delta: &StockDelta) -> Result<usize>;

    /// Replaces key and quantity of record `id` only when it exists and no
    /// other record already owns `key`. Returns the number of rows changed.
    async fn conditional_update(&self, id: u64, key: &StockKey, quantity: u64) -> Result<usize>;

    async fn find(&self, criteria: &Criteria, sort: Option<SortField>) -> Result<Vec<StockRecord>>;

    /// Insert-or-add for every record, committed as one unit.
    async fn save_all(&self, records: &[StockDelta]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, color: &str, percentage: u8) -> StockRecord {
        StockRecord {
            id,
            color: color.to_string(),
            percentage,
            quantity: 10,
        }
    }

    #[test]
    fn test_sort_field_from_str() {
        assert_eq!("COLOR".parse::<SortField>().unwrap(), SortField::Color);
        assert_eq!(
            "cottonContent".parse::<SortField>().unwrap(),
            SortField::Percentage
        );
        assert_eq!(
            "percentage".parse::<SortField>().unwrap(),
            SortField::Percentage
        );
        assert!(matches!(
            "size".parse::<SortField>(),
            Err(InventoryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_between_is_inclusive() {
        let criteria = Criteria::PercentageBetween(1, 50);
        assert!(criteria.matches(&record(1, "Red", 1)));
        assert!(criteria.matches(&record(2, "Red", 50)));
        assert!(!criteria.matches(&record(3, "Red", 51)));
    }

    #[test]
    fn test_arrange_keeps_input_order_when_unsorted() {
        let records = vec![record(1, "Red", 100), record(2, "Blue", 50), record(3, "Red", 1)];
        let ids: Vec<_> = Criteria::PercentageBelow(100)
            .arrange(records, None)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_arrange_color_always_by_percentage() {
        let records = vec![record(1, "Red", 100), record(2, "Blue", 50), record(3, "Red", 1)];
        let arranged = Criteria::Color("Red".to_string()).arrange(records, Some(SortField::Color));
        let percentages: Vec<_> = arranged.iter().map(|r| r.percentage).collect();
        assert_eq!(percentages, vec![1, 100]);
    }

    #[test]
    fn test_arrange_sorts_by_color() {
        let records = vec![record(1, "Red", 100), record(2, "Blue", 50), record(3, "Gray", 1)];
        let colors: Vec<_> = Criteria::All
            .arrange(records, Some(SortField::Color))
            .into_iter()
            .map(|r| r.color)
            .collect();
        assert_eq!(colors, vec!["Blue", "Gray", "Red"]);
    }
}
