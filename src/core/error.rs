//! Error kinds surfaced by the inventory core.

use std::time::Duration;
use thiserror::Error;

pub type Result<T, E = InventoryError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum InventoryError {
    /// Outcome exceeds the available quantity, or the key has no record.
    #[error("Not enough socks in stock to perform outcome operation")]
    InsufficientStock,

    /// Update targets a missing record or collides with another record's key.
    #[error("Conflict detected or sock not found")]
    Conflict,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Malformed batch input at row {row}: {reason}")]
    MalformedInput { row: usize, reason: String },

    #[error("Batch aggregation did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Internal failure: {0}")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl InventoryError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        InventoryError::InvalidArgument(msg.into())
    }

    pub fn malformed(row: usize, reason: impl Into<String>) -> Self {
        InventoryError::MalformedInput {
            row,
            reason: reason.into(),
        }
    }
}

impl From<fjall::Error> for InventoryError {
    fn from(e: fjall::Error) -> Self {
        InventoryError::Internal(Box::new(e))
    }
}

impl From<serde_json::Error> for InventoryError {
    fn from(e: serde_json::Error) -> Self {
        InventoryError::Internal(Box::new(e))
    }
}

impl From<std::io::Error> for InventoryError {
    fn from(e: std::io::Error) -> Self {
        InventoryError::Internal(Box::new(e))
    }
}

impl From<tokio::task::JoinError> for InventoryError {
    fn from(e: tokio::task::JoinError) -> Self {
        InventoryError::Internal(Box::new(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_caller_expectations() {
        assert_eq!(
            InventoryError::InsufficientStock.to_string(),
            "Not enough socks in stock to perform outcome operation"
        );
        assert_eq!(
            InventoryError::Conflict.to_string(),
            "Conflict detected or sock not found"
        );
        assert_eq!(
            InventoryError::malformed(3, "missing quantity").to_string(),
            "Malformed batch input at row 3: missing quantity"
        );
    }

    #[test]
    fn test_domain_error_converts_into_anyhow() {
        let err: anyhow::Error = InventoryError::Conflict.into();
        assert!(matches!(
            err.downcast_ref::<InventoryError>(),
            Some(InventoryError::Conflict)
        ));
    }
}
