//! Core domain types and logic.

pub mod backtest;
pub mod comparison;
pub mod config_validation;
pub mod error;
pub mod execution;
pub mod feed;
pub mod indicator;
pub mod metrics;
pub mod ohlcv;
pub mod portfolio;
pub mod position;
pub mod strategy;
