use super::ui;
use crate::core::config::AppConfig;
use crate::core::crash::{AverageCostLookup, CrashDetector};
use crate::core::price::MarketSnapshot;
use anyhow::Result;
use comfy_table::Cell;

pub fn run(
    config: &AppConfig,
    snapshot: &MarketSnapshot,
    lookup: &dyn AverageCostLookup,
) -> Result<()> {
    let detector = CrashDetector::new(config);
    let opportunities = detector.detect(&snapshot.all_prices(), snapshot.tao_price, lookup);

    if opportunities.is_empty() {
        println!(
            "\n{}",
            ui::style_text(
                "No crash opportunities right now. Stick to the weekly plan.",
                ui::StyleType::Subtle
            )
        );
        return Ok(());
    }

    println!(
        "\n{}",
        ui::style_text("Crash Opportunities", ui::StyleType::Title)
    );

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Current"),
        ui::header_cell("Reference"),
        ui::header_cell("Drop"),
        ui::header_cell("Tier"),
        ui::header_cell("Multiplier"),
        ui::header_cell("Suggested"),
    ]);
    for opp in opportunities.values() {
        table.add_row(vec![
            Cell::new(&opp.symbol),
            ui::value_cell(ui::format_usd(opp.current_price)),
            ui::value_cell(ui::format_usd(opp.avg_price)),
            ui::change_cell(-opp.drop_percent * 100.0),
            ui::value_cell(opp.tier.to_string()),
            ui::value_cell(format!("{:.1}x", opp.multiplier)),
            ui::value_cell(ui::format_usd(opp.suggested_amount)),
        ]);
    }
    println!("{table}");

    let total: f64 = opportunities.values().map(|o| o.suggested_amount).sum();
    println!(
        "{} {}",
        ui::style_text("Total suggested extra:", ui::StyleType::TotalLabel),
        ui::style_text(&ui::format_usd(total), ui::StyleType::TotalValue)
    );
    Ok(())
}
