use super::ui;
use crate::store::HistoryStore;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

const DEFAULT_OUTPUT: &str = "investment_history.csv";

pub fn run(store: &HistoryStore, output: Option<&Path>) -> Result<()> {
    let path: PathBuf = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    store.export_csv(&path)?;
    info!(records = store.len(), "Exported history");
    println!(
        "{} {} records to {}",
        ui::style_text("Exported", ui::StyleType::TotalLabel),
        store.len(),
        path.display()
    );
    Ok(())
}
