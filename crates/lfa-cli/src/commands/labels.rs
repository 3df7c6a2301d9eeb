use anyhow::Result;
use serde::Serialize;

use lfa_core::labels::COUNT_UNIT;
use lfa_core::metrics_table;

#[derive(Serialize)]
struct LabelRow {
    index: usize,
    name: &'static str,
    bacterial_count: u64,
    cell_count: u64,
}

/// Print the label table with derived counts.
pub fn cmd_labels(json: bool) -> Result<()> {
    let rows: Vec<LabelRow> = metrics_table()
        .iter()
        .map(|(label, metrics)| LabelRow {
            index: label.index(),
            name: label.name(),
            bacterial_count: metrics.bacterial_count,
            cell_count: metrics.cell_count,
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "{:<6} {:<14} {:>20} {:>16}",
        "Index", "Label", "Bacterial count", "Cell count"
    );
    for row in &rows {
        println!(
            "{:<6} {:<14} {:>13} {} {:>9} {}",
            row.index, row.name, row.bacterial_count, COUNT_UNIT, row.cell_count, COUNT_UNIT
        );
    }

    Ok(())
}
