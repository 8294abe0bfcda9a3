//! Domain error types.
//!
//! Configuration and data problems are fatal and surface before (or instead
//! of) a result. Recoverable conditions never appear here; they are recorded
//! as [`EngineEvent`](crate::domain::backtest::EngineEvent)s on the result.

use chrono::NaiveDateTime;

/// Rejected configuration, raised before any simulation starts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown strategy code: {code}")]
    UnknownStrategy { code: String },

    #[error("initial_cash must be positive, got {value}")]
    NonPositiveInitialCash { value: f64 },

    #[error("commission_rate must be non-negative, got {value}")]
    NegativeCommission { value: f64 },

    #[error("exclusive_orders must be true")]
    ExclusiveOrdersRequired,

    #[error("invalid position sizing: {reason}")]
    InvalidPositionSizing { reason: String },

    #[error("invalid strategy parameters for {strategy}: {reason}")]
    InvalidStrategyParams { strategy: String, reason: String },

    #[error("start date {start} must be before end date {end}")]
    InvalidDateRange { start: String, end: String },

    #[error("config parse error in {file}: {reason}")]
    Parse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    Missing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    Invalid {
        section: String,
        key: String,
        reason: String,
    },
}

/// Malformed or insufficient input data. Aborts the run with no output.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataError {
    #[error("price feed is empty")]
    EmptyFeed,

    #[error("insufficient data: have {bars} bars, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("timestamp at bar {index} ({timestamp}) is not after the previous bar")]
    NonMonotonicTimestamp {
        index: usize,
        timestamp: NaiveDateTime,
    },

    #[error("non-finite {field} price at bar {index}")]
    NonFinitePrice { index: usize, field: &'static str },

    #[error("invalid volume at bar {index}: {value}")]
    InvalidVolume { index: usize, value: f64 },

    #[error("missing indicator series {indicator}")]
    MissingIndicator { indicator: String },

    #[error("indicator {indicator} has {len} values, feed has {expected} bars")]
    MisalignedIndicator {
        indicator: String,
        len: usize,
        expected: usize,
    },

    #[error("data source error: {reason}")]
    Source { reason: String },
}

/// Top-level error type for quantbench.
#[derive(Debug, thiserror::Error)]
pub enum BacktestError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("backtest cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&BacktestError> for std::process::ExitCode {
    fn from(err: &BacktestError) -> Self {
        let code: u8 = match err {
            BacktestError::Io(_) => 1,
            BacktestError::Config(_) => 2,
            BacktestError::Data(_) => 5,
            BacktestError::Cancelled => 130,
        };
        std::process::ExitCode::from(code)
    }
}
