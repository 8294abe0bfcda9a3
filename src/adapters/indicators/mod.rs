//! Builtin indicator math.
//!
//! Lookbacks match the common technical-analysis conventions: SMA and
//! Bollinger report from bar `n - 1`, RSI and ATR from bar `n`, MACD line
//! and signal together from bar `slow + signal - 2`, VWAP from the first bar
//! with volume.

mod atr;
mod bollinger;
mod macd;
mod moving_average;
mod rsi;
mod vwap;

pub use atr::calculate_atr;
pub use bollinger::{calculate_bollinger, Band};
pub use macd::{calculate_macd, MacdOutput};
pub use moving_average::{calculate_ema, calculate_sma};
pub use rsi::calculate_rsi;
pub use vwap::calculate_vwap;

use crate::domain::indicator::IndicatorKey;
use crate::domain::ohlcv::Bar;
use crate::ports::indicator_port::IndicatorPort;

#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinIndicators;

impl IndicatorPort for BuiltinIndicators {
    fn compute(&self, key: &IndicatorKey, bars: &[Bar]) -> Vec<Option<f64>> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        match *key {
            IndicatorKey::Sma(period) => calculate_sma(&closes, period),
            IndicatorKey::MacdLine { fast, slow, signal } => {
                calculate_macd(&closes, fast, slow, signal).line
            }
            IndicatorKey::MacdSignal { fast, slow, signal } => {
                calculate_macd(&closes, fast, slow, signal).signal
            }
            IndicatorKey::Rsi(period) => calculate_rsi(&closes, period),
            IndicatorKey::BollingerUpper {
                period,
                stddev_mult_x100,
            } => calculate_bollinger(&closes, period, stddev_mult_x100, Band::Upper),
            IndicatorKey::BollingerLower {
                period,
                stddev_mult_x100,
            } => calculate_bollinger(&closes, period, stddev_mult_x100, Band::Lower),
            IndicatorKey::Atr(period) => calculate_atr(bars, period),
            IndicatorKey::Vwap => calculate_vwap(bars),
        }
    }
}
