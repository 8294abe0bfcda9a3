//! Port traits: the boundaries between the backtest core and the outside.

pub mod config_port;
pub mod data_port;
pub mod indicator_port;
pub mod report_port;
