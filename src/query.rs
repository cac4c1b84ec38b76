//! Filter resolution for stock listings.
//!
//! A filter selects exactly one path, checked in this order: operator with a
//! percentage threshold, color equality, percentage range, then everything.

use crate::core::error::{InventoryError, Result};
use crate::core::model::check_percentage;
use crate::core::{Criteria, SortField, StockLedger, StockRecord};
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    MoreThan,
    LessThan,
    Equal,
}

impl FromStr for Operator {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethan" => Ok(Operator::MoreThan),
            "lessthan" => Ok(Operator::LessThan),
            "equal" => Ok(Operator::Equal),
            _ => Err(InventoryError::invalid(format!("Invalid operator: {s}"))),
        }
    }
}

impl Operator {
    pub fn criteria(self, threshold: u8) -> Criteria {
        match self {
            Operator::MoreThan => Criteria::PercentageAbove(threshold),
            Operator::LessThan => Criteria::PercentageBelow(threshold),
            Operator::Equal => Criteria::PercentageEqual(threshold),
        }
    }
}

/// Raw listing parameters as a caller supplies them.
///
/// `percentage` is both the operator threshold and the lower bound of a range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockFilter {
    pub color: Option<String>,
    pub operation: Option<String>,
    pub percentage: Option<u8>,
    pub max_percentage: Option<u8>,
    pub sort_by: Option<String>,
}

/// Turns a filter into ledger criteria, rejecting unknown operators and sort
/// fields before anything reaches storage.
pub fn resolve(filter: &StockFilter) -> Result<(Criteria, Option<SortField>)> {
    let sort = filter
        .sort_by
        .as_deref()
        .map(SortField::from_str)
        .transpose()?;

    let criteria = match (filter, &filter.operation, filter.percentage) {
        (_, Some(op), Some(threshold)) => op.parse::<Operator>()?.criteria(check_percentage(threshold)?),
        (StockFilter { color: Some(color), .. }, _, _) => {
            let color = color.trim();
            if color.is_empty() {
                return Err(InventoryError::invalid("color must not be blank"));
            }
            Criteria::Color(color.to_string())
        }
        (StockFilter { max_percentage: Some(max), .. }, _, Some(min)) => {
            check_percentage(*max)?;
            if min > *max {
                return Err(InventoryError::invalid(format!(
                    "percentage range is empty: {min} > {max}"
                )));
            }
            Criteria::PercentageBetween(min, *max)
        }
        _ => Criteria::All,
    };
    Ok((criteria, sort))
}

pub async fn select(ledger: &dyn StockLedger, filter: &StockFilter) -> Result<Vec<StockRecord>> {
    let (criteria, sort) = resolve(filter)?;
    debug!(?criteria, ?sort, "Querying ledger");
    ledger.find(&criteria, sort).await
}
