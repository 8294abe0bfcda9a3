//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod indicators;
pub mod text_report;
pub mod trade_log;
