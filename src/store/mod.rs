pub mod history;

pub use history::{HistoryStore, InvestmentRecord, NewRecord, RecordKind};
