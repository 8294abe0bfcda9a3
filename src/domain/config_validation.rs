//! Configuration validation and typed config construction.
//!
//! Every field is checked before any data is loaded or any run starts.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::domain::backtest::{BacktestConfig, PositionSizing};
use crate::domain::error::ConfigError;
use crate::domain::strategy::{MacdParams, Strategy};
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_STRATEGY_CODES: &str = "SMA,MACD,RSI";
pub const DEFAULT_START_DATE: &str = "2023-01-01";
pub const DEFAULT_END_DATE: &str = "2025-01-01";
pub const DEFAULT_DATA_DIR: &str = "data";

/// Which series to load and from where.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRequest {
    pub symbol: String,
    pub data_dir: PathBuf,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), ConfigError> {
    build_data_request(config)?;
    build_backtest_config(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), ConfigError> {
    build_strategies(config, None)?;
    Ok(())
}

pub fn build_data_request(config: &dyn ConfigPort) -> Result<DataRequest, ConfigError> {
    let symbol = config
        .get_string("backtest", "symbol")
        .ok_or_else(|| ConfigError::Missing {
            section: "backtest".to_string(),
            key: "symbol".to_string(),
        })?;
    let data_dir = config
        .get_string("backtest", "data_dir")
        .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());

    let start_date = parse_date(config, "start_date", DEFAULT_START_DATE)?;
    let end_date = parse_date(config, "end_date", DEFAULT_END_DATE)?;
    if start_date >= end_date {
        return Err(ConfigError::InvalidDateRange {
            start: start_date.to_string(),
            end: end_date.to_string(),
        });
    }

    Ok(DataRequest {
        symbol: symbol.to_uppercase(),
        data_dir: PathBuf::from(data_dir),
        start_date,
        end_date,
    })
}

fn parse_date(config: &dyn ConfigPort, key: &str, default: &str) -> Result<NaiveDate, ConfigError> {
    let raw = config
        .get_string("backtest", key)
        .unwrap_or_else(|| default.to_string());
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| ConfigError::Invalid {
        section: "backtest".to_string(),
        key: key.to_string(),
        reason: format!("expected YYYY-MM-DD, got '{raw}'"),
    })
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, ConfigError> {
    let defaults = BacktestConfig::default();

    let sizing = config
        .get_string("backtest", "position_sizing")
        .unwrap_or_else(|| "full_equity".to_string());
    let position_sizing = match sizing.to_lowercase().as_str() {
        "full_equity" | "fraction" => PositionSizing::FractionOfEquity(
            config
                .get_double("backtest", "position_fraction")?
                .unwrap_or(1.0),
        ),
        "fixed_units" => {
            let units = config
                .get_double("backtest", "units")?
                .ok_or_else(|| ConfigError::Missing {
                    section: "backtest".to_string(),
                    key: "units".to_string(),
                })?;
            PositionSizing::FixedUnits(units)
        }
        other => {
            return Err(ConfigError::InvalidPositionSizing {
                reason: format!("unknown policy '{other}', expected full_equity or fixed_units"),
            });
        }
    };

    let backtest = BacktestConfig {
        initial_cash: config
            .get_double("backtest", "initial_cash")?
            .unwrap_or(defaults.initial_cash),
        commission_rate: config
            .get_double("backtest", "commission_rate")?
            .unwrap_or(defaults.commission_rate),
        exclusive_orders: config
            .get_bool("backtest", "exclusive_orders")?
            .unwrap_or(defaults.exclusive_orders),
        position_sizing,
    };
    backtest.validate()?;
    Ok(backtest)
}

/// Strategies named by `codes_override`, or by `[strategy] codes`.
///
/// Parameters come from the `[strategy]` section, falling back to each
/// variant's defaults. Duplicated codes are run once.
pub fn build_strategies(
    config: &dyn ConfigPort,
    codes_override: Option<&str>,
) -> Result<Vec<Strategy>, ConfigError> {
    let codes = codes_override
        .map(str::to_string)
        .or_else(|| config.get_string("strategy", "codes"))
        .unwrap_or_else(|| DEFAULT_STRATEGY_CODES.to_string());

    let mut strategies: Vec<Strategy> = Vec::new();
    for code in codes.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        let strategy = apply_params(config, code.parse::<Strategy>()?)?;
        strategy.validate()?;
        if !strategies.iter().any(|s| s.code() == strategy.code()) {
            strategies.push(strategy);
        }
    }

    if strategies.is_empty() {
        return Err(ConfigError::Invalid {
            section: "strategy".to_string(),
            key: "codes".to_string(),
            reason: "no strategy codes given".to_string(),
        });
    }
    Ok(strategies)
}

fn apply_params(config: &dyn ConfigPort, strategy: Strategy) -> Result<Strategy, ConfigError> {
    let usize_or = |key: &str, default: usize| -> Result<usize, ConfigError> {
        Ok(config.get_usize("strategy", key)?.unwrap_or(default))
    };
    let f64_or = |key: &str, default: f64| -> Result<f64, ConfigError> {
        Ok(config.get_double("strategy", key)?.unwrap_or(default))
    };
    let macd = |defaults: MacdParams| -> Result<MacdParams, ConfigError> {
        Ok(MacdParams {
            fast: usize_or("macd_fast", defaults.fast)?,
            slow: usize_or("macd_slow", defaults.slow)?,
            signal: usize_or("macd_signal", defaults.signal)?,
        })
    };

    Ok(match strategy {
        Strategy::SmaCrossover { fast, slow } => Strategy::SmaCrossover {
            fast: usize_or("sma_fast", fast)?,
            slow: usize_or("sma_slow", slow)?,
        },
        Strategy::Macd(params) => Strategy::Macd(macd(params)?),
        Strategy::RsiMeanReversion {
            period,
            oversold,
            overbought,
        } => Strategy::RsiMeanReversion {
            period: usize_or("rsi_period", period)?,
            oversold: f64_or("rsi_lower", oversold)?,
            overbought: f64_or("rsi_upper", overbought)?,
        },
        Strategy::BollingerBands {
            period,
            stddev_mult_x100,
        } => {
            let mult = f64_or("bb_stddev", stddev_mult_x100 as f64 / 100.0)?;
            if mult <= 0.0 {
                return Err(ConfigError::Invalid {
                    section: "strategy".to_string(),
                    key: "bb_stddev".to_string(),
                    reason: "band width must be positive".to_string(),
                });
            }
            Strategy::BollingerBands {
                period: usize_or("bb_period", period)?,
                stddev_mult_x100: (mult * 100.0).round() as u32,
            }
        }
        Strategy::MaAtrStop {
            ma_period,
            atr_period,
            atr_mult,
        } => Strategy::MaAtrStop {
            ma_period: usize_or("maatr_ma", ma_period)?,
            atr_period: usize_or("maatr_atr", atr_period)?,
            atr_mult: f64_or("maatr_mult", atr_mult)?,
        },
        Strategy::Vwap => Strategy::Vwap,
        Strategy::DualMaMacd { fast, slow, macd: m } => Strategy::DualMaMacd {
            fast: usize_or("dma_fast", fast)?,
            slow: usize_or("dma_slow", slow)?,
            macd: macd(m)?,
        },
    })
}
