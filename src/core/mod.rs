//! Core business logic abstractions

pub mod config;
pub mod error;
pub mod ledger;
pub mod log;
pub mod model;

// Re-export main types for cleaner imports
pub use error::InventoryError;
pub use ledger::{Criteria, SortField, StockLedger};
pub use model::{StockDelta, StockKey, StockRecord};
