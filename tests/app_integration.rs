use socks::AppCommand;
use socks::core::config::AppConfig;
use socks::core::{Criteria, InventoryError, SortField, StockRecord};
use socks::query::StockFilter;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tracing::info;

mod test_utils {
    use super::*;

    /// Writes a config pointing the disk ledger at a fresh temp directory.
    pub fn write_config(dir: &TempDir) -> String {
        let data_path = dir.path().join("data");
        let config_path = dir.path().join("config.yaml");
        let config_content = format!(
            r#"
        storage: disk
        data_path: "{}"
        batch:
          workers: 3
          timeout_secs: 10
    "#,
            data_path.display()
        );
        fs::write(&config_path, config_content).expect("Failed to write config file");
        config_path.to_string_lossy().into_owned()
    }

    pub async fn stored_records(config_path: &str) -> Vec<StockRecord> {
        let config = AppConfig::load_from_path(config_path).expect("Failed to load config");
        let ledger = socks::store::open_ledger(&config).expect("Failed to open ledger");
        ledger
            .find(&Criteria::All, Some(SortField::Color))
            .await
            .expect("Failed to read ledger")
    }

    pub fn income(color: &str, percentage: u8, quantity: u64) -> AppCommand {
        AppCommand::Income {
            color: color.to_string(),
            percentage,
            quantity,
        }
    }

    pub fn outcome(color: &str, percentage: u8, quantity: u64) -> AppCommand {
        AppCommand::Outcome {
            color: color.to_string(),
            percentage,
            quantity,
        }
    }

    pub fn write_batch(path: &Path, content: &str) {
        fs::write(path, content).expect("Failed to write batch file");
    }
}

use test_utils::*;

#[test_log::test(tokio::test)]
async fn test_income_outcome_flow_on_disk() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir);

    socks::run_command(income("Red", 100, 10), Some(&config_path))
        .await
        .unwrap();

    let result = socks::run_command(outcome("Red", 100, 11), Some(&config_path)).await;
    let err = result.expect_err("Outcome above stock should fail");
    info!(error = %err, "Outcome rejected as expected");
    assert!(matches!(
        err.downcast_ref::<InventoryError>(),
        Some(InventoryError::InsufficientStock)
    ));

    socks::run_command(outcome("Red", 100, 1), Some(&config_path))
        .await
        .unwrap();

    let records = stored_records(&config_path).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].quantity, 9);
}

#[test_log::test(tokio::test)]
async fn test_update_conflicts_and_success() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir);

    socks::run_command(income("Red", 100, 10), Some(&config_path))
        .await
        .unwrap();
    socks::run_command(income("Blue", 50, 3), Some(&config_path))
        .await
        .unwrap();

    let records = stored_records(&config_path).await;
    let blue = records.iter().find(|r| r.color == "Blue").unwrap().id;

    let missing = socks::run_command(
        AppCommand::Update {
            id: 12345,
            color: "Red".to_string(),
            percentage: 100,
            quantity: 1,
        },
        Some(&config_path),
    )
    .await;
    assert!(matches!(
        missing.unwrap_err().downcast_ref::<InventoryError>(),
        Some(InventoryError::Conflict)
    ));

    let collision = socks::run_command(
        AppCommand::Update {
            id: blue,
            color: "Red".to_string(),
            percentage: 100,
            quantity: 1,
        },
        Some(&config_path),
    )
    .await;
    assert!(matches!(
        collision.unwrap_err().downcast_ref::<InventoryError>(),
        Some(InventoryError::Conflict)
    ));

    socks::run_command(
        AppCommand::Update {
            id: blue,
            color: "Navy".to_string(),
            percentage: 60,
            quantity: 7,
        },
        Some(&config_path),
    )
    .await
    .unwrap();

    let records = stored_records(&config_path).await;
    assert_eq!(records.len(), 2);
    assert_eq!(
        (records[0].id, records[0].color.as_str(), records[0].percentage, records[0].quantity),
        (blue, "Navy", 60, 7)
    );
    assert_eq!((records[1].color.as_str(), records[1].quantity), ("Red", 10));
}

#[test_log::test(tokio::test)]
async fn test_batch_upload_sums_duplicate_rows() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir);
    let batch_path = dir.path().join("socks.csv");
    write_batch(
        &batch_path,
        "color,cottonPart,quantity\nRed,100,5\nRed,100,5\nBlue,50,3\n",
    );

    socks::run_command(
        AppCommand::Batch {
            file: batch_path.clone(),
        },
        Some(&config_path),
    )
    .await
    .unwrap();

    let records = stored_records(&config_path).await;
    let totals: Vec<_> = records
        .iter()
        .map(|r| (r.color.as_str(), r.percentage, r.quantity))
        .collect();
    assert_eq!(totals, vec![("Blue", 50, 3), ("Red", 100, 10)]);
}

#[test_log::test(tokio::test)]
async fn test_malformed_batch_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir);
    let batch_path = dir.path().join("broken.csv");
    write_batch(
        &batch_path,
        "color,cottonPart,quantity\nRed,100,5\nBlue,abc,3\nGray,10,1\n",
    );

    let result = socks::run_command(AppCommand::Batch { file: batch_path }, Some(&config_path)).await;
    let err = result.expect_err("Malformed batch should fail");
    assert!(matches!(
        err.downcast_ref::<InventoryError>(),
        Some(InventoryError::MalformedInput { row: 2, .. })
    ));

    assert!(stored_records(&config_path).await.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_list_rejects_unknown_operator() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir);

    socks::run_command(income("Red", 1, 10), Some(&config_path))
        .await
        .unwrap();

    let ok = socks::run_command(
        AppCommand::List {
            filter: StockFilter {
                operation: Some("lessThan".to_string()),
                percentage: Some(100),
                ..StockFilter::default()
            },
            json: true,
        },
        Some(&config_path),
    )
    .await;
    assert!(ok.is_ok(), "List failed with: {:?}", ok.err());

    let bad = socks::run_command(
        AppCommand::List {
            filter: StockFilter {
                operation: Some("around".to_string()),
                percentage: Some(10),
                ..StockFilter::default()
            },
            json: false,
        },
        Some(&config_path),
    )
    .await;
    assert!(matches!(
        bad.unwrap_err().downcast_ref::<InventoryError>(),
        Some(InventoryError::InvalidArgument(_))
    ));
}

#[test_log::test(tokio::test)]
async fn test_missing_config_file_fails() {
    let result = socks::run_command(
        income("Red", 100, 1),
        Some("/nonexistent/socks/config.yaml"),
    )
    .await;
    assert!(result.is_err());
}
