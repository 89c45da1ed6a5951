use super::ui;
use crate::core::allocation::{AllocationEngine, InvestmentPlan, Units};
use crate::core::config::AppConfig;
use crate::core::price::MarketSnapshot;
use anyhow::{Context, Result};
use comfy_table::Cell;

pub fn run(config: &AppConfig, snapshot: &MarketSnapshot) -> Result<()> {
    let engine = AllocationEngine::new(config);
    let plan = engine
        .weekly_plan(&snapshot.stocks, &snapshot.cryptos, snapshot.tao_price)
        .context("Failed to compute weekly plan")?;
    render(&plan);
    Ok(())
}

pub fn render(plan: &InvestmentPlan) {
    println!(
        "\n{}",
        ui::style_text("Weekly Purchase Plan", ui::StyleType::Title)
    );

    let mut stocks = ui::new_styled_table();
    stocks.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Shares"),
        ui::header_cell("Price"),
        ui::header_cell("Cost"),
    ]);
    for line in plan.stocks.values() {
        let shares = match line.units {
            Units::Shares(n) => n.to_string(),
            Units::Quantity(q) => format!("{q:.6}"),
        };
        stocks.add_row(vec![
            Cell::new(&line.symbol),
            ui::value_cell(shares),
            ui::value_cell(ui::format_usd(line.price)),
            ui::value_cell(ui::format_usd(line.amount)),
        ]);
    }
    println!("{stocks}");
    println!(
        "{} {}",
        ui::style_text("Stock subtotal:", ui::StyleType::TotalLabel),
        ui::style_text(&ui::format_usd(plan.stock_total), ui::StyleType::TotalValue)
    );

    let mut cryptos = ui::new_styled_table();
    cryptos.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Quantity"),
        ui::header_cell("Price"),
        ui::header_cell("Cost"),
    ]);
    for line in plan.cryptos.values() {
        cryptos.add_row(vec![
            Cell::new(&line.symbol),
            ui::value_cell(format!("{:.6}", line.units.as_f64())),
            ui::value_cell(ui::format_usd(line.price)),
            ui::value_cell(ui::format_usd(line.amount)),
        ]);
    }
    println!("{cryptos}");
    println!(
        "{} {} ({})",
        ui::style_text("Crypto subtotal:", ui::StyleType::TotalLabel),
        ui::style_text(&ui::format_usd(plan.crypto_total), ui::StyleType::TotalValue),
        ui::format_tao(plan.crypto_tao_amount)
    );

    ui::print_separator();
    println!(
        "{} {}",
        ui::style_text("Total this week:", ui::StyleType::TotalLabel),
        ui::style_text(&ui::format_usd(plan.total_budget), ui::StyleType::TotalValue)
    );
}
