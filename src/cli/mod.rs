//! Command implementations and console output helpers.

pub mod crash;
pub mod export;
pub mod history;
pub mod market;
pub mod plan;
pub mod prices;
pub mod record;
pub mod returns;
pub mod setup;
pub mod ui;
