use super::ui;
use crate::core::config::AppConfig;
use crate::core::price::MarketSnapshot;
use anyhow::Result;
use comfy_table::Cell;

pub fn run(config: &AppConfig, snapshot: &MarketSnapshot) -> Result<()> {
    println!("\n{}", ui::style_text("Current Prices", ui::StyleType::Title));

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Class"),
        ui::header_cell("Price"),
    ]);

    for symbol in config.portfolio.stock_allocation.keys() {
        if let Some(&price) = snapshot.stocks.get(symbol) {
            table.add_row(vec![
                Cell::new(symbol),
                Cell::new("stock"),
                ui::value_cell(ui::format_usd(price)),
            ]);
        }
    }
    for symbol in config.portfolio.crypto_allocation.keys() {
        if let Some(&price) = snapshot.cryptos.get(symbol) {
            table.add_row(vec![
                Cell::new(symbol),
                Cell::new("crypto"),
                ui::value_cell(ui::format_usd(price)),
            ]);
        }
    }
    println!("{table}");

    println!(
        "{} {}",
        ui::style_text("TAO conversion price:", ui::StyleType::TotalLabel),
        ui::style_text(&ui::format_usd(snapshot.tao_price), ui::StyleType::TotalValue)
    );
    Ok(())
}
