//! JSON-file-backed purchase history.
//!
//! The whole file is rewritten on every mutation; there are no partial
//! updates and no transaction guarantees beyond the atomicity of a single
//! file write. A missing or corrupt file starts an empty history with a
//! warning rather than aborting, so a damaged data file never blocks
//! planning.

use crate::core::crash::AverageCostLookup;
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Stock,
    Crypto,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Stock => "stock",
            RecordKind::Crypto => "crypto",
        }
    }
}

/// A stored purchase. `id` and `recorded_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentRecord {
    pub id: u64,
    pub date: NaiveDate,
    pub recorded_at: DateTime<Utc>,
    pub kind: RecordKind,
    pub symbol: String,
    pub quantity: f64,
    pub price: f64,
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A purchase as submitted by the caller, before the store assigns its
/// identity fields.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub date: NaiveDate,
    pub kind: RecordKind,
    pub symbol: String,
    pub quantity: f64,
    pub price: f64,
    pub total: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Metadata {
    created_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HistoryFile {
    records: Vec<InvestmentRecord>,
    metadata: Metadata,
}

impl HistoryFile {
    fn empty(now: DateTime<Utc>) -> Self {
        HistoryFile {
            records: Vec::new(),
            metadata: Metadata {
                created_at: now,
                last_updated: now,
            },
        }
    }
}

/// Aggregate spend report.
#[derive(Debug, Clone, PartialEq)]
pub struct TotalInvested {
    pub grand_total: f64,
    pub by_kind: BTreeMap<String, f64>,
    /// Keyed by `YYYY-MM`.
    pub by_month: BTreeMap<String, f64>,
}

/// Aggregate position per symbol over the full history.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionSummary {
    pub kind: RecordKind,
    pub quantity: f64,
    pub total_cost: f64,
    pub average_cost: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetReturn {
    pub quantity: f64,
    pub average_cost: f64,
    pub current_price: f64,
    pub cost_basis: f64,
    pub current_value: f64,
    pub profit: f64,
    pub return_percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnsReport {
    pub cost_basis: f64,
    pub current_value: f64,
    pub profit: f64,
    pub return_percent: f64,
    pub assets: BTreeMap<String, AssetReturn>,
}

/// Purchase cadence over distinct record dates.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyStats {
    pub record_count: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub min_interval_days: i64,
    pub max_interval_days: i64,
    pub mean_interval_days: f64,
    pub median_interval_days: f64,
}

pub struct HistoryStore {
    path: PathBuf,
    data: HistoryFile,
}

impl HistoryStore {
    /// Opens the history at `path`, creating an empty one if the file does
    /// not exist or cannot be parsed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<HistoryFile>(&contents) {
                Ok(data) => {
                    debug!(records = data.records.len(), "Loaded history");
                    data
                }
                Err(e) => {
                    warn!("Unreadable history file {}: {e}, starting fresh", path.display());
                    HistoryFile::empty(Utc::now())
                }
            },
            Err(_) => {
                debug!("No history file at {}, starting fresh", path.display());
                HistoryFile::empty(Utc::now())
            }
        };
        Ok(HistoryStore { path, data })
    }

    /// Appends a purchase and persists the whole file. Returns the assigned
    /// record id.
    pub fn record(&mut self, new: NewRecord) -> Result<u64> {
        if new.quantity <= 0.0 || new.price <= 0.0 || new.total <= 0.0 {
            bail!(
                "record for {} must have positive quantity, price and total",
                new.symbol
            );
        }
        if new.symbol.trim().is_empty() {
            bail!("record symbol must not be empty");
        }

        let id = self
            .data
            .records
            .iter()
            .map(|r| r.id)
            .max()
            .unwrap_or(0)
            + 1;
        let now = Utc::now();
        self.data.records.push(InvestmentRecord {
            id,
            date: new.date,
            recorded_at: now,
            kind: new.kind,
            symbol: new.symbol,
            quantity: new.quantity,
            price: new.price,
            total: new.total,
            notes: new.notes,
        });
        self.data.metadata.last_updated = now;
        self.save()?;
        Ok(id)
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write history file: {}", self.path.display()))?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.data.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.records.len()
    }

    /// The most recent `limit` records, newest first.
    pub fn recent(&self, limit: usize) -> Vec<&InvestmentRecord> {
        let mut records: Vec<&InvestmentRecord> = self.data.records.iter().collect();
        records.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        records.truncate(limit);
        records
    }

    /// Records with `start <= date <= end`, oldest first.
    pub fn by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<&InvestmentRecord> {
        let mut records: Vec<&InvestmentRecord> = self
            .data
            .records
            .iter()
            .filter(|r| r.date >= start && r.date <= end)
            .collect();
        records.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        records
    }

    /// Quantity-weighted average cost of `symbol` over purchases dated
    /// within `lookback_days` before `as_of` (inclusive).
    pub fn average_cost_at(
        &self,
        symbol: &str,
        lookback_days: u32,
        as_of: NaiveDate,
    ) -> Option<f64> {
        let window_start = as_of - Duration::days(i64::from(lookback_days));
        let mut total_cost = 0.0;
        let mut total_quantity = 0.0;
        for record in &self.data.records {
            if record.symbol == symbol && record.date >= window_start && record.date <= as_of {
                total_cost += record.total;
                total_quantity += record.quantity;
            }
        }
        if total_quantity > 0.0 {
            Some(total_cost / total_quantity)
        } else {
            None
        }
    }

    /// Grand total and per-kind / per-month breakdowns.
    pub fn total_invested(&self) -> TotalInvested {
        let mut by_kind = BTreeMap::new();
        let mut by_month = BTreeMap::new();
        let mut grand_total = 0.0;
        for record in &self.data.records {
            grand_total += record.total;
            *by_kind
                .entry(record.kind.as_str().to_string())
                .or_insert(0.0) += record.total;
            *by_month
                .entry(record.date.format("%Y-%m").to_string())
                .or_insert(0.0) += record.total;
        }
        TotalInvested {
            grand_total,
            by_kind,
            by_month,
        }
    }

    /// Aggregate quantity, cost and average cost per symbol.
    pub fn composition(&self) -> BTreeMap<String, PositionSummary> {
        let mut positions: BTreeMap<String, PositionSummary> = BTreeMap::new();
        for record in &self.data.records {
            let position = positions
                .entry(record.symbol.clone())
                .or_insert(PositionSummary {
                    kind: record.kind,
                    quantity: 0.0,
                    total_cost: 0.0,
                    average_cost: 0.0,
                });
            position.quantity += record.quantity;
            position.total_cost += record.total;
        }
        for position in positions.values_mut() {
            if position.quantity > 0.0 {
                position.average_cost = position.total_cost / position.quantity;
            }
        }
        positions
    }

    /// Cost basis against current prices. Symbols without a quote are left
    /// out of the per-asset table and of the totals.
    pub fn returns(
        &self,
        current_prices: &std::collections::HashMap<String, f64>,
    ) -> ReturnsReport {
        let mut assets = BTreeMap::new();
        let mut cost_basis = 0.0;
        let mut current_value = 0.0;

        for (symbol, position) in self.composition() {
            let Some(&price) = current_prices.get(&symbol) else {
                continue;
            };
            let value = position.quantity * price;
            let profit = value - position.total_cost;
            cost_basis += position.total_cost;
            current_value += value;
            assets.insert(
                symbol,
                AssetReturn {
                    quantity: position.quantity,
                    average_cost: position.average_cost,
                    current_price: price,
                    cost_basis: position.total_cost,
                    current_value: value,
                    profit,
                    return_percent: if position.total_cost > 0.0 {
                        (profit / position.total_cost) * 100.0
                    } else {
                        0.0
                    },
                },
            );
        }

        let profit = current_value - cost_basis;
        ReturnsReport {
            cost_basis,
            current_value,
            profit,
            return_percent: if cost_basis > 0.0 {
                (profit / cost_basis) * 100.0
            } else {
                0.0
            },
            assets,
        }
    }

    /// Purchase cadence over distinct record dates; `None` with fewer than
    /// two distinct dates.
    pub fn frequency_stats(&self) -> Option<FrequencyStats> {
        let mut dates: Vec<NaiveDate> = self.data.records.iter().map(|r| r.date).collect();
        dates.sort();
        dates.dedup();
        if dates.len() < 2 {
            return None;
        }

        let mut intervals: Vec<i64> = dates
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).num_days())
            .collect();
        intervals.sort();

        let sum: i64 = intervals.iter().sum();
        let mid = intervals.len() / 2;
        let median = if intervals.len() % 2 == 0 {
            (intervals[mid - 1] + intervals[mid]) as f64 / 2.0
        } else {
            intervals[mid] as f64
        };

        Some(FrequencyStats {
            record_count: self.data.records.len(),
            first_date: dates[0],
            last_date: dates[dates.len() - 1],
            min_interval_days: intervals[0],
            max_interval_days: intervals[intervals.len() - 1],
            mean_interval_days: sum as f64 / intervals.len() as f64,
            median_interval_days: median,
        })
    }

    /// Writes all records as CSV, oldest first.
    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path.as_ref()).with_context(|| {
            format!("Failed to create CSV file: {}", path.as_ref().display())
        })?;
        writer.write_record(["Date", "Type", "Symbol", "Quantity", "Price", "Total", "Notes"])?;

        let mut records: Vec<&InvestmentRecord> = self.data.records.iter().collect();
        records.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        for record in records {
            writer.write_record([
                record.date.to_string(),
                record.kind.as_str().to_string(),
                record.symbol.clone(),
                format!("{:.6}", record.quantity),
                format!("{:.2}", record.price),
                format!("{:.2}", record.total),
                record.notes.clone().unwrap_or_default(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Copies the history file into `dir` with a timestamped name and
    /// returns the backup path.
    pub fn backup<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create backup directory: {}", dir.display()))?;
        let name = format!("history_backup_{}.json", Utc::now().format("%Y%m%d_%H%M%S"));
        let backup_path = dir.join(name);
        let json = serde_json::to_string_pretty(&self.data)?;
        fs::write(&backup_path, json)
            .with_context(|| format!("Failed to write backup: {}", backup_path.display()))?;
        Ok(backup_path)
    }
}

impl AverageCostLookup for HistoryStore {
    fn average_cost(&self, symbol: &str, lookback_days: u32) -> Option<f64> {
        self.average_cost_at(symbol, lookback_days, Utc::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn stock(date_str: &str, symbol: &str, quantity: f64, price: f64) -> NewRecord {
        NewRecord {
            date: date(date_str),
            kind: RecordKind::Stock,
            symbol: symbol.to_string(),
            quantity,
            price,
            total: quantity * price,
            notes: None,
        }
    }

    #[test]
    fn test_record_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut store = HistoryStore::open(&path).unwrap();
        assert!(store.is_empty());
        let id1 = store.record(stock("2026-08-03", "QQQ", 3.0, 350.0)).unwrap();
        let id2 = store.record(stock("2026-08-10", "QQQ", 2.0, 340.0)).unwrap();
        assert_eq!((id1, id2), (1, 2));

        let reloaded = HistoryStore::open(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        let recent = reloaded.recent(1);
        assert_eq!(recent[0].date, date("2026-08-10"));
        assert_eq!(recent[0].total, 680.0);
    }

    #[test]
    fn test_record_rejects_nonpositive_values() {
        let dir = tempdir().unwrap();
        let mut store = HistoryStore::open(dir.path().join("history.json")).unwrap();

        assert!(store.record(stock("2026-08-03", "QQQ", 0.0, 350.0)).is_err());
        assert!(store.record(stock("2026-08-03", "", 1.0, 350.0)).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_corrupt_file_starts_fresh() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{not json").unwrap();

        let store = HistoryStore::open(&path).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_by_date_range() {
        let dir = tempdir().unwrap();
        let mut store = HistoryStore::open(dir.path().join("history.json")).unwrap();
        store.record(stock("2026-07-06", "QQQ", 1.0, 360.0)).unwrap();
        store.record(stock("2026-07-20", "VOO", 1.0, 420.0)).unwrap();
        store.record(stock("2026-08-03", "QQQ", 1.0, 350.0)).unwrap();

        let range = store.by_date_range(date("2026-07-10"), date("2026-08-03"));
        assert_eq!(range.len(), 2);
        assert_eq!(range[0].symbol, "VOO");
        assert_eq!(range[1].symbol, "QQQ");
    }

    #[test]
    fn test_average_cost_window_and_weighting() {
        let dir = tempdir().unwrap();
        let mut store = HistoryStore::open(dir.path().join("history.json")).unwrap();
        // Inside a 30-day window ending 2026-08-20: 3 @ 350 and 1 @ 390.
        store.record(stock("2026-08-01", "QQQ", 3.0, 350.0)).unwrap();
        store.record(stock("2026-08-15", "QQQ", 1.0, 390.0)).unwrap();
        // Outside the window and a different symbol.
        store.record(stock("2026-05-01", "QQQ", 10.0, 500.0)).unwrap();
        store.record(stock("2026-08-10", "VOO", 1.0, 420.0)).unwrap();

        let avg = store
            .average_cost_at("QQQ", 30, date("2026-08-20"))
            .unwrap();
        assert!((avg - (1050.0 + 390.0) / 4.0).abs() < 1e-9);

        assert!(store.average_cost_at("GLDM", 30, date("2026-08-20")).is_none());
        // Only the stale purchase exists inside a tiny window.
        assert!(store.average_cost_at("QQQ", 3, date("2026-06-20")).is_none());
    }

    #[test]
    fn test_total_invested_breakdowns() {
        let dir = tempdir().unwrap();
        let mut store = HistoryStore::open(dir.path().join("history.json")).unwrap();
        store.record(stock("2026-07-06", "QQQ", 1.0, 350.0)).unwrap();
        store.record(stock("2026-08-03", "QQQ", 1.0, 340.0)).unwrap();
        store
            .record(NewRecord {
                date: date("2026-08-03"),
                kind: RecordKind::Crypto,
                symbol: "BTC".to_string(),
                quantity: 0.01,
                price: 45000.0,
                total: 450.0,
                notes: None,
            })
            .unwrap();

        let totals = store.total_invested();
        assert!((totals.grand_total - 1140.0).abs() < 1e-9);
        assert_eq!(totals.by_kind["stock"], 690.0);
        assert_eq!(totals.by_kind["crypto"], 450.0);
        assert_eq!(totals.by_month["2026-07"], 350.0);
        assert_eq!(totals.by_month["2026-08"], 790.0);
    }

    #[test]
    fn test_composition_and_returns() {
        let dir = tempdir().unwrap();
        let mut store = HistoryStore::open(dir.path().join("history.json")).unwrap();
        store.record(stock("2026-07-06", "QQQ", 3.0, 350.0)).unwrap();
        store.record(stock("2026-08-03", "QQQ", 1.0, 390.0)).unwrap();

        let composition = store.composition();
        let qqq = &composition["QQQ"];
        assert_eq!(qqq.quantity, 4.0);
        assert_eq!(qqq.total_cost, 1440.0);
        assert_eq!(qqq.average_cost, 360.0);

        let prices = std::collections::HashMap::from([("QQQ".to_string(), 400.0)]);
        let report = store.returns(&prices);
        assert_eq!(report.cost_basis, 1440.0);
        assert_eq!(report.current_value, 1600.0);
        assert_eq!(report.profit, 160.0);
        assert!((report.return_percent - 160.0 / 1440.0 * 100.0).abs() < 1e-9);
        assert_eq!(report.assets["QQQ"].profit, 160.0);
    }

    #[test]
    fn test_frequency_stats() {
        let dir = tempdir().unwrap();
        let mut store = HistoryStore::open(dir.path().join("history.json")).unwrap();
        assert!(store.frequency_stats().is_none());

        // Weekly cadence with one late purchase; two records share a date.
        store.record(stock("2026-07-06", "QQQ", 1.0, 350.0)).unwrap();
        store.record(stock("2026-07-06", "VOO", 1.0, 420.0)).unwrap();
        store.record(stock("2026-07-13", "QQQ", 1.0, 350.0)).unwrap();
        store.record(stock("2026-07-20", "QQQ", 1.0, 350.0)).unwrap();
        store.record(stock("2026-08-03", "QQQ", 1.0, 350.0)).unwrap();

        let stats = store.frequency_stats().unwrap();
        assert_eq!(stats.record_count, 5);
        assert_eq!(stats.first_date, date("2026-07-06"));
        assert_eq!(stats.last_date, date("2026-08-03"));
        // Intervals between distinct dates: 7, 7, 14.
        assert_eq!(stats.min_interval_days, 7);
        assert_eq!(stats.max_interval_days, 14);
        assert!((stats.mean_interval_days - 28.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.median_interval_days, 7.0);
    }

    #[test]
    fn test_export_csv() {
        let dir = tempdir().unwrap();
        let mut store = HistoryStore::open(dir.path().join("history.json")).unwrap();
        store.record(stock("2026-08-03", "QQQ", 3.0, 350.0)).unwrap();
        store
            .record(NewRecord {
                date: date("2026-07-06"),
                kind: RecordKind::Crypto,
                symbol: "BTC".to_string(),
                quantity: 0.01,
                price: 45000.0,
                total: 450.0,
                notes: Some("dip buy".to_string()),
            })
            .unwrap();

        let csv_path = dir.path().join("export.csv");
        store.export_csv(&csv_path).unwrap();

        let contents = fs::read_to_string(&csv_path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Date,Type,Symbol,Quantity,Price,Total,Notes"
        );
        // Oldest first
        assert_eq!(
            lines.next().unwrap(),
            "2026-07-06,crypto,BTC,0.010000,45000.00,450.00,dip buy"
        );
        assert_eq!(
            lines.next().unwrap(),
            "2026-08-03,stock,QQQ,3.000000,350.00,1050.00,"
        );
    }

    #[test]
    fn test_backup_creates_timestamped_copy() {
        let dir = tempdir().unwrap();
        let mut store = HistoryStore::open(dir.path().join("history.json")).unwrap();
        store.record(stock("2026-08-03", "QQQ", 1.0, 350.0)).unwrap();

        let backup_dir = dir.path().join("backups");
        let backup_path = store.backup(&backup_dir).unwrap();
        let name = backup_path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("history_backup_"));
        assert!(name.ends_with(".json"));

        let restored: HistoryFile =
            serde_json::from_str(&fs::read_to_string(&backup_path).unwrap()).unwrap();
        assert_eq!(restored.records.len(), 1);
    }
}
