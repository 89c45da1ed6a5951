use super::ui;
use crate::core::allocation::AllocationEngine;
use crate::core::config::AppConfig;
use crate::core::price::MarketSnapshot;
use crate::store::{HistoryStore, NewRecord, RecordKind};
use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

/// Computes today's plan and appends every purchase line to the history.
pub fn run(
    config: &AppConfig,
    snapshot: &MarketSnapshot,
    store: &mut HistoryStore,
    notes: Option<&str>,
) -> Result<()> {
    let engine = AllocationEngine::new(config);
    let plan = engine
        .weekly_plan(&snapshot.stocks, &snapshot.cryptos, snapshot.tao_price)
        .context("Failed to compute weekly plan")?;

    let today = Utc::now().date_naive();
    let mut recorded = 0usize;

    for (line, kind) in plan
        .stocks
        .values()
        .map(|l| (l, RecordKind::Stock))
        .chain(plan.cryptos.values().map(|l| (l, RecordKind::Crypto)))
    {
        let id = store.record(NewRecord {
            date: today,
            kind,
            symbol: line.symbol.clone(),
            quantity: line.units.as_f64(),
            price: line.price,
            total: line.amount,
            notes: notes.map(str::to_string),
        })?;
        info!(id, symbol = %line.symbol, "Recorded purchase");
        recorded += 1;
    }

    super::plan::render(&plan);
    println!(
        "\n{} {} purchases recorded for {} ({} total)",
        ui::style_text("Done:", ui::StyleType::TotalLabel),
        recorded,
        today,
        ui::style_text(&ui::format_usd(plan.total_budget), ui::StyleType::TotalValue)
    );
    Ok(())
}
