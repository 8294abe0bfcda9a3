//! quantbench: single-instrument strategy backtester.
//!
//! Hexagonal architecture: the simulation and metrics engine lives in
//! [`domain`], port traits in [`ports`], concrete implementations (CSV data,
//! INI config, indicator math, reports) in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
