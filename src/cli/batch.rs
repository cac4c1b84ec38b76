use super::ui;
use crate::batch::{BatchAggregator, BatchSummary};
use anyhow::{Context, Result};
use comfy_table::Cell;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub fn display_summary(summary: &BatchSummary) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Color"),
        ui::header_cell("Percentage (%)"),
        ui::header_cell("Added"),
    ]);
    for delta in &summary.records {
        table.add_row(vec![
            Cell::new(delta.color()),
            ui::number_cell(delta.percentage()),
            ui::number_cell(delta.quantity),
        ]);
    }

    format!(
        "{}\n\n{}\n{}",
        ui::style_text("Batch uploaded successfully", ui::StyleType::Title),
        table,
        ui::style_text(
            &format!(
                "{} rows merged into {} records",
                summary.rows,
                summary.records.len()
            ),
            ui::StyleType::Subtle
        )
    )
}

pub async fn run(aggregator: &BatchAggregator, path: &Path) -> Result<()> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open batch file: {}", path.display()))?;

    let pb = ui::new_spinner("Aggregating rows...");
    let result = aggregator.ingest(BufReader::new(file)).await;
    pb.finish_and_clear();

    let summary = result.with_context(|| format!("Error processing file: {}", path.display()))?;
    println!("{}", display_summary(&summary));
    Ok(())
}
