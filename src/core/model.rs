//! Stock records and the values used to mutate them.

use crate::core::error::{InventoryError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub const MAX_PERCENTAGE: u8 = 100;

/// Identity of a stock record: the (color, percentage) pair.
///
/// Colors are case-sensitive. Two keys are equal only when both components
/// match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StockKey {
    pub color: String,
    pub percentage: u8,
}

impl StockKey {
    /// Builds a key, trimming the color and rejecting blank colors or
    /// percentages above 100.
    pub fn new(color: &str, percentage: u8) -> Result<Self> {
        let color = color.trim();
        if color.is_empty() {
            return Err(InventoryError::invalid("color must not be blank"));
        }
        check_percentage(percentage)?;
        Ok(Self {
            color: color.to_string(),
            percentage,
        })
    }
}

impl Display for StockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.color, self.percentage)
    }
}

/// A quantity change (or a target quantity) for a single key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDelta {
    pub key: StockKey,
    pub quantity: u64,
}

impl StockDelta {
    /// Builds a delta for income or outcome; the quantity must be positive.
    pub fn new(color: &str, percentage: u8, quantity: u64) -> Result<Self> {
        let key = StockKey::new(color, percentage)?;
        if quantity == 0 {
            return Err(InventoryError::invalid("quantity must be positive"));
        }
        Ok(Self { key, quantity })
    }

    pub fn color(&self) -> &str {
        &self.key.color
    }

    pub fn percentage(&self) -> u8 {
        self.key.percentage
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: u64,
    pub color: String,
    pub percentage: u8,
    pub quantity: u64,
}

impl StockRecord {
    pub fn key(&self) -> StockKey {
        StockKey {
            color: self.color.clone(),
            percentage: self.percentage,
        }
    }

    pub fn matches(&self, key: &StockKey) -> bool {
        self.percentage == key.percentage && self.color == key.color
    }
}

pub fn check_percentage(percentage: u8) -> Result<u8> {
    if percentage > MAX_PERCENTAGE {
        return Err(InventoryError::invalid(format!(
            "percentage must be between 0 and {MAX_PERCENTAGE}, got {percentage}"
        )));
    }
    Ok(percentage)
}

/// Adds two quantities, rejecting overflow instead of wrapping.
pub fn add_quantity(current: u64, added: u64) -> Result<u64> {
    current
        .checked_add(added)
        .ok_or_else(|| InventoryError::invalid("quantity overflow"))
}
