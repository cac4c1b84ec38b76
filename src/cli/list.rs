use super::ui;
use crate::core::StockRecord;
use crate::inventory::Inventory;
use crate::query::StockFilter;
use anyhow::Result;
use comfy_table::Cell;

/// Renders records as a table followed by the total quantity.
pub fn display_as_table(records: &[StockRecord]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Id"),
        ui::header_cell("Color"),
        ui::header_cell("Percentage (%)"),
        ui::header_cell("Quantity"),
    ]);

    for record in records {
        table.add_row(vec![
            ui::number_cell(record.id),
            Cell::new(&record.color),
            ui::number_cell(record.percentage),
            ui::number_cell(record.quantity),
        ]);
    }

    let total: u128 = records.iter().map(|r| u128::from(r.quantity)).sum();
    format!(
        "{}\n\n{}: {}",
        table,
        ui::style_text("Total quantity", ui::StyleType::TotalLabel),
        ui::style_text(&total.to_string(), ui::StyleType::Success)
    )
}

pub async fn run(inventory: &Inventory, filter: &StockFilter, json: bool) -> Result<()> {
    let records = inventory.query(filter).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else if records.is_empty() {
        println!("No socks match the given filters.");
    } else {
        println!("{}", display_as_table(&records));
    }
    Ok(())
}
