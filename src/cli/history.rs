use super::ui;
use crate::store::HistoryStore;
use anyhow::Result;
use comfy_table::Cell;

pub fn run(store: &HistoryStore, limit: usize) -> Result<()> {
    if store.is_empty() {
        println!(
            "\n{}",
            ui::style_text("No purchases recorded yet.", ui::StyleType::Subtle)
        );
        return Ok(());
    }

    println!(
        "\n{}",
        ui::style_text("Recent Purchases", ui::StyleType::Title)
    );

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Type"),
        ui::header_cell("Symbol"),
        ui::header_cell("Quantity"),
        ui::header_cell("Price"),
        ui::header_cell("Total"),
        ui::header_cell("Notes"),
    ]);
    for record in store.recent(limit) {
        table.add_row(vec![
            Cell::new(record.date.to_string()),
            Cell::new(record.kind.as_str()),
            Cell::new(&record.symbol),
            ui::value_cell(format!("{:.6}", record.quantity)),
            ui::value_cell(ui::format_usd(record.price)),
            ui::value_cell(ui::format_usd(record.total)),
            Cell::new(record.notes.as_deref().unwrap_or("")),
        ]);
    }
    println!("{table}");

    let totals = store.total_invested();
    println!(
        "{} {}",
        ui::style_text("Total invested:", ui::StyleType::TotalLabel),
        ui::style_text(&ui::format_usd(totals.grand_total), ui::StyleType::TotalValue)
    );
    for (kind, amount) in &totals.by_kind {
        println!("  {kind}: {}", ui::format_usd(*amount));
    }

    if let Some(stats) = store.frequency_stats() {
        println!(
            "\n{}",
            ui::style_text("Cadence", ui::StyleType::TotalLabel)
        );
        println!(
            "  {} records between {} and {}",
            stats.record_count, stats.first_date, stats.last_date
        );
        println!(
            "  interval days: min {} / median {:.1} / mean {:.1} / max {}",
            stats.min_interval_days,
            stats.median_interval_days,
            stats.mean_interval_days,
            stats.max_interval_days
        );
    }
    Ok(())
}
