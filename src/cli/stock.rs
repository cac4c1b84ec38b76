use super::ui;
use crate::core::{StockDelta, StockKey};
use crate::inventory::Inventory;
use anyhow::Result;

pub async fn income(inventory: &Inventory, color: &str, percentage: u8, quantity: u64) -> Result<()> {
    let delta = StockDelta::new(color, percentage, quantity)?;
    let record = inventory.register_income(&delta).await?;
    println!(
        "{} {}",
        ui::style_text("Income registered successfully.", ui::StyleType::Success),
        ui::style_text(
            &format!("#{} {} now holds {}", record.id, record.key(), record.quantity),
            ui::StyleType::Subtle
        )
    );
    Ok(())
}

pub async fn outcome(inventory: &Inventory, color: &str, percentage: u8, quantity: u64) -> Result<()> {
    let delta = StockDelta::new(color, percentage, quantity)?;
    inventory.register_outcome(&delta).await?;
    println!(
        "{}",
        ui::style_text("Outcome registered successfully.", ui::StyleType::Success)
    );
    Ok(())
}

pub async fn update(
    inventory: &Inventory,
    id: u64,
    color: &str,
    percentage: u8,
    quantity: u64,
) -> Result<()> {
    let key = StockKey::new(color, percentage)?;
    inventory.update_record(id, &key, quantity).await?;
    println!(
        "{}",
        ui::style_text("Socks updated successfully.", ui::StyleType::Success)
    );
    Ok(())
}
