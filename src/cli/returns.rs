use super::ui;
use crate::core::price::MarketSnapshot;
use crate::store::HistoryStore;
use anyhow::Result;
use comfy_table::Cell;

pub fn run(store: &HistoryStore, snapshot: &MarketSnapshot) -> Result<()> {
    let report = store.returns(&snapshot.all_prices());

    if report.assets.is_empty() {
        println!(
            "\n{}",
            ui::style_text(
                "No priced holdings in the history yet.",
                ui::StyleType::Subtle
            )
        );
        return Ok(());
    }

    println!("\n{}", ui::style_text("Returns", ui::StyleType::Title));

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Quantity"),
        ui::header_cell("Avg Cost"),
        ui::header_cell("Price"),
        ui::header_cell("Cost Basis"),
        ui::header_cell("Value"),
        ui::header_cell("Return"),
    ]);
    for (symbol, asset) in &report.assets {
        table.add_row(vec![
            Cell::new(symbol),
            ui::value_cell(format!("{:.6}", asset.quantity)),
            ui::value_cell(ui::format_usd(asset.average_cost)),
            ui::value_cell(ui::format_usd(asset.current_price)),
            ui::value_cell(ui::format_usd(asset.cost_basis)),
            ui::value_cell(ui::format_usd(asset.current_value)),
            ui::change_cell(asset.return_percent),
        ]);
    }
    println!("{table}");

    println!(
        "{} {} on {} invested ({:+.2}%)",
        ui::style_text("Total profit:", ui::StyleType::TotalLabel),
        ui::style_text(&ui::format_usd(report.profit), ui::StyleType::TotalValue),
        ui::format_usd(report.cost_basis),
        report.return_percent
    );
    Ok(())
}
