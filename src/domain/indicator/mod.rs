//! Indicator identities and pre-computed indicator arrays.
//!
//! The engine never computes indicators. It consumes an [`IndicatorFrame`]
//! of series aligned index-for-index with the feed, where `None` marks a
//! value that is not ready yet (lookback not satisfied).
//!
//! - `IndicatorKey`: indicator identity + parameters (serves as map key)
//! - `IndicatorFrame`: the full set of aligned series for one feed
//! - `IndicatorView`: a read-only window of the frame that ends at the
//!   current bar, so strategies cannot see the future

use super::error::DataError;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorKey {
    Sma(usize),
    MacdLine {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    MacdSignal {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Rsi(usize),
    BollingerUpper {
        period: usize,
        stddev_mult_x100: u32,
    },
    BollingerLower {
        period: usize,
        stddev_mult_x100: u32,
    },
    Atr(usize),
    Vwap,
}

impl IndicatorKey {
    /// Number of bars the indicator needs before its first valid value.
    ///
    /// The first valid index is `lookback() - 1`. MACD line and signal are
    /// both reported once the signal EMA is seeded; RSI and ATR need one
    /// extra bar for the first price change.
    pub fn lookback(&self) -> usize {
        match *self {
            IndicatorKey::Sma(period) => period,
            IndicatorKey::MacdLine { slow, signal, .. }
            | IndicatorKey::MacdSignal { slow, signal, .. } => slow + signal - 1,
            IndicatorKey::Rsi(period) => period + 1,
            IndicatorKey::BollingerUpper { period, .. }
            | IndicatorKey::BollingerLower { period, .. } => period,
            IndicatorKey::Atr(period) => period + 1,
            IndicatorKey::Vwap => 1,
        }
    }
}

impl fmt::Display for IndicatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKey::Sma(period) => write!(f, "SMA({})", period),
            IndicatorKey::MacdLine { fast, slow, signal } => {
                write!(f, "MACD_LINE({},{},{})", fast, slow, signal)
            }
            IndicatorKey::MacdSignal { fast, slow, signal } => {
                write!(f, "MACD_SIGNAL({},{},{})", fast, slow, signal)
            }
            IndicatorKey::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorKey::BollingerUpper {
                period,
                stddev_mult_x100,
            } => write!(
                f,
                "BB_UPPER({},{})",
                period,
                *stddev_mult_x100 as f64 / 100.0
            ),
            IndicatorKey::BollingerLower {
                period,
                stddev_mult_x100,
            } => write!(
                f,
                "BB_LOWER({},{})",
                period,
                *stddev_mult_x100 as f64 / 100.0
            ),
            IndicatorKey::Atr(period) => write!(f, "ATR({})", period),
            IndicatorKey::Vwap => write!(f, "VWAP"),
        }
    }
}

/// Indicator series aligned with a feed. `None` means "not ready".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorFrame {
    series: BTreeMap<IndicatorKey, Vec<Option<f64>>>,
}

impl IndicatorFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: IndicatorKey, values: Vec<Option<f64>>) {
        self.series.insert(key, values);
    }

    pub fn with_series(mut self, key: IndicatorKey, values: Vec<Option<f64>>) -> Self {
        self.insert(key, values);
        self
    }

    pub fn get(&self, key: &IndicatorKey) -> Option<&[Option<f64>]> {
        self.series.get(key).map(|v| v.as_slice())
    }

    pub fn contains(&self, key: &IndicatorKey) -> bool {
        self.series.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &IndicatorKey> {
        self.series.keys()
    }

    /// Check that every key is present and has exactly `len` values.
    pub fn validate(&self, keys: &[IndicatorKey], len: usize) -> Result<(), DataError> {
        for key in keys {
            let series = self
                .series
                .get(key)
                .ok_or_else(|| DataError::MissingIndicator {
                    indicator: key.to_string(),
                })?;
            if series.len() != len {
                return Err(DataError::MisalignedIndicator {
                    indicator: key.to_string(),
                    len: series.len(),
                    expected: len,
                });
            }
        }
        Ok(())
    }
}

/// Read-only view of a frame truncated at bar `current`.
///
/// Any lookup past `current` yields `None`, exactly like a value that is not
/// ready. Non-finite values are treated as not ready as well.
#[derive(Debug, Clone, Copy)]
pub struct IndicatorView<'a> {
    frame: &'a IndicatorFrame,
    current: usize,
}

impl<'a> IndicatorView<'a> {
    pub fn new(frame: &'a IndicatorFrame, current: usize) -> Self {
        Self { frame, current }
    }

    pub fn index(&self) -> usize {
        self.current
    }

    pub fn value(&self, key: &IndicatorKey, index: usize) -> Option<f64> {
        if index > self.current {
            return None;
        }
        self.frame
            .get(key)
            .and_then(|series| series.get(index).copied().flatten())
            .filter(|v| v.is_finite())
    }

    /// Value at the current bar.
    pub fn now(&self, key: &IndicatorKey) -> Option<f64> {
        self.value(key, self.current)
    }

    /// Value at the bar before the current one.
    pub fn prev(&self, key: &IndicatorKey) -> Option<f64> {
        self.current
            .checked_sub(1)
            .and_then(|index| self.value(key, index))
    }
}
