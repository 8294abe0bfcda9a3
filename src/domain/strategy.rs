//! Strategy variants and their per-bar decision rules.
//!
//! A [`Strategy`] is a closed set of rule families selected by configuration.
//! Each variant declares the indicators it needs and a pure decision
//! function. Decisions only ever see `history = bars[..=i]` and an
//! [`IndicatorView`] ending at `i`, so look-ahead cannot be expressed.

use std::fmt;
use std::str::FromStr;

use super::error::ConfigError;
use super::indicator::{IndicatorKey, IndicatorView};
use super::ohlcv::Bar;

pub const DEFAULT_SMA_FAST: usize = 10;
pub const DEFAULT_SMA_SLOW: usize = 20;
pub const DEFAULT_MACD_FAST: usize = 12;
pub const DEFAULT_MACD_SLOW: usize = 26;
pub const DEFAULT_MACD_SIGNAL: usize = 9;
pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const DEFAULT_RSI_OVERSOLD: f64 = 30.0;
pub const DEFAULT_RSI_OVERBOUGHT: f64 = 70.0;
pub const DEFAULT_BB_PERIOD: usize = 20;
pub const DEFAULT_BB_STDDEV_X100: u32 = 200;
pub const DEFAULT_MAATR_MA: usize = 50;
pub const DEFAULT_MAATR_ATR: usize = 14;
pub const DEFAULT_MAATR_MULT: f64 = 2.0;
pub const DEFAULT_DMA_FAST: usize = 10;
pub const DEFAULT_DMA_SLOW: usize = 50;

/// Every supported strategy code, in display order.
pub const STRATEGY_CODES: [&str; 7] = ["SMA", "MACD", "RSI", "BB", "MAATR", "VWAP", "DMA"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        MacdParams {
            fast: DEFAULT_MACD_FAST,
            slow: DEFAULT_MACD_SLOW,
            signal: DEFAULT_MACD_SIGNAL,
        }
    }
}

impl MacdParams {
    pub fn line(&self) -> IndicatorKey {
        IndicatorKey::MacdLine {
            fast: self.fast,
            slow: self.slow,
            signal: self.signal,
        }
    }

    pub fn signal_line(&self) -> IndicatorKey {
        IndicatorKey::MacdSignal {
            fast: self.fast,
            slow: self.slow,
            signal: self.signal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    SmaCrossover {
        fast: usize,
        slow: usize,
    },
    Macd(MacdParams),
    RsiMeanReversion {
        period: usize,
        oversold: f64,
        overbought: f64,
    },
    BollingerBands {
        period: usize,
        stddev_mult_x100: u32,
    },
    MaAtrStop {
        ma_period: usize,
        atr_period: usize,
        atr_mult: f64,
    },
    Vwap,
    DualMaMacd {
        fast: usize,
        slow: usize,
        macd: MacdParams,
    },
}

impl Strategy {
    /// The variant for `code` with its documented default parameters.
    pub fn from_code(code: &str) -> Result<Self, ConfigError> {
        code.parse()
    }

    pub fn code(&self) -> &'static str {
        match self {
            Strategy::SmaCrossover { .. } => "SMA",
            Strategy::Macd(_) => "MACD",
            Strategy::RsiMeanReversion { .. } => "RSI",
            Strategy::BollingerBands { .. } => "BB",
            Strategy::MaAtrStop { .. } => "MAATR",
            Strategy::Vwap => "VWAP",
            Strategy::DualMaMacd { .. } => "DMA",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::SmaCrossover { .. } => "SMA Crossover",
            Strategy::Macd(_) => "MACD",
            Strategy::RsiMeanReversion { .. } => "RSI Mean Reversion",
            Strategy::BollingerBands { .. } => "Bollinger Bands",
            Strategy::MaAtrStop { .. } => "MA + ATR Stop",
            Strategy::Vwap => "VWAP",
            Strategy::DualMaMacd { .. } => "Dual MA + MACD Filter",
        }
    }

    /// Indicator series the decision function reads.
    pub fn requirements(&self) -> Vec<IndicatorKey> {
        match *self {
            Strategy::SmaCrossover { fast, slow } => {
                vec![IndicatorKey::Sma(fast), IndicatorKey::Sma(slow)]
            }
            Strategy::Macd(params) => vec![params.line(), params.signal_line()],
            Strategy::RsiMeanReversion { period, .. } => vec![IndicatorKey::Rsi(period)],
            Strategy::BollingerBands {
                period,
                stddev_mult_x100,
            } => vec![
                IndicatorKey::BollingerUpper {
                    period,
                    stddev_mult_x100,
                },
                IndicatorKey::BollingerLower {
                    period,
                    stddev_mult_x100,
                },
            ],
            Strategy::MaAtrStop {
                ma_period,
                atr_period,
                ..
            } => vec![IndicatorKey::Sma(ma_period), IndicatorKey::Atr(atr_period)],
            Strategy::Vwap => vec![IndicatorKey::Vwap],
            Strategy::DualMaMacd { fast, slow, macd } => vec![
                IndicatorKey::Sma(fast),
                IndicatorKey::Sma(slow),
                macd.line(),
            ],
        }
    }

    /// Minimum bars required before every indicator is ready.
    pub fn min_bars(&self) -> usize {
        self.requirements()
            .iter()
            .map(IndicatorKey::lookback)
            .max()
            .unwrap_or(1)
    }

    /// First bar index at which signals are evaluated.
    pub fn warmup_offset(&self) -> usize {
        self.min_bars().saturating_sub(1)
    }

    /// Reject parameter combinations no indicator can satisfy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidStrategyParams {
            strategy: self.code().to_string(),
            reason: reason.to_string(),
        };
        let check_macd = |m: &MacdParams| {
            if m.fast == 0 || m.slow == 0 || m.signal == 0 {
                Err(invalid("MACD periods must be positive"))
            } else if m.fast >= m.slow {
                Err(invalid("MACD fast period must be shorter than slow"))
            } else {
                Ok(())
            }
        };

        match self {
            Strategy::SmaCrossover { fast, slow } | Strategy::DualMaMacd { fast, slow, .. } => {
                if *fast == 0 || *slow == 0 {
                    return Err(invalid("moving average periods must be positive"));
                }
                if fast >= slow {
                    return Err(invalid("fast period must be shorter than slow"));
                }
                if let Strategy::DualMaMacd { macd, .. } = self {
                    check_macd(macd)?;
                }
                Ok(())
            }
            Strategy::Macd(params) => check_macd(params),
            Strategy::RsiMeanReversion {
                period,
                oversold,
                overbought,
            } => {
                if *period == 0 {
                    return Err(invalid("RSI period must be positive"));
                }
                if !(0.0..=100.0).contains(oversold)
                    || !(0.0..=100.0).contains(overbought)
                    || oversold >= overbought
                {
                    return Err(invalid("RSI bounds must satisfy 0 <= oversold < overbought <= 100"));
                }
                Ok(())
            }
            Strategy::BollingerBands {
                period,
                stddev_mult_x100,
            } => {
                if *period == 0 || *stddev_mult_x100 == 0 {
                    return Err(invalid("period and band width must be positive"));
                }
                Ok(())
            }
            Strategy::MaAtrStop {
                ma_period,
                atr_period,
                atr_mult,
            } => {
                if *ma_period == 0 || *atr_period == 0 {
                    return Err(invalid("MA and ATR periods must be positive"));
                }
                if !atr_mult.is_finite() || *atr_mult <= 0.0 {
                    return Err(invalid("ATR multiplier must be positive"));
                }
                Ok(())
            }
            Strategy::Vwap => Ok(()),
        }
    }

    /// Whether every required indicator has a value at the current bar.
    pub fn is_ready(&self, view: &IndicatorView) -> bool {
        self.requirements().iter().all(|key| view.now(key).is_some())
    }

    /// Decide at bar `history.len() - 1`. Missing values yield `Hold`.
    pub fn decide(&self, history: &[Bar], view: &IndicatorView) -> Signal {
        let Some(bar) = history.last() else {
            return Signal::Hold;
        };
        let close = bar.close;

        match *self {
            Strategy::SmaCrossover { fast, slow } => {
                let (fast, slow) = (IndicatorKey::Sma(fast), IndicatorKey::Sma(slow));
                crossover_signal(
                    crosses_above(view, &fast, &slow),
                    crosses_above(view, &slow, &fast),
                )
            }
            Strategy::Macd(params) => {
                let (line, signal) = (params.line(), params.signal_line());
                crossover_signal(
                    crosses_above(view, &line, &signal),
                    crosses_above(view, &signal, &line),
                )
            }
            Strategy::RsiMeanReversion {
                period,
                oversold,
                overbought,
            } => match view.now(&IndicatorKey::Rsi(period)) {
                Some(rsi) if rsi < oversold => Signal::Buy,
                Some(rsi) if rsi > overbought => Signal::Sell,
                _ => Signal::Hold,
            },
            Strategy::BollingerBands {
                period,
                stddev_mult_x100,
            } => {
                let upper = view.now(&IndicatorKey::BollingerUpper {
                    period,
                    stddev_mult_x100,
                });
                let lower = view.now(&IndicatorKey::BollingerLower {
                    period,
                    stddev_mult_x100,
                });
                match (upper, lower) {
                    (Some(_), Some(lower)) if close < lower => Signal::Buy,
                    (Some(upper), Some(_)) if close > upper => Signal::Sell,
                    _ => Signal::Hold,
                }
            }
            Strategy::MaAtrStop {
                ma_period,
                atr_period,
                ..
            } => {
                let ma = view.now(&IndicatorKey::Sma(ma_period));
                let atr = view.now(&IndicatorKey::Atr(atr_period));
                match (ma, atr) {
                    (Some(ma), Some(_)) if close > ma => Signal::Buy,
                    (Some(ma), Some(_)) if close < ma => Signal::Sell,
                    _ => Signal::Hold,
                }
            }
            Strategy::Vwap => match view.now(&IndicatorKey::Vwap) {
                Some(vwap) if close > vwap => Signal::Buy,
                Some(_) => Signal::Sell,
                None => Signal::Hold,
            },
            Strategy::DualMaMacd { fast, slow, macd } => {
                let (fast, slow) = (IndicatorKey::Sma(fast), IndicatorKey::Sma(slow));
                let Some(macd_line) = view.now(&macd.line()) else {
                    return Signal::Hold;
                };
                if crosses_above(view, &fast, &slow) && macd_line > 0.0 {
                    Signal::Buy
                } else if crosses_above(view, &slow, &fast) && macd_line < 0.0 {
                    Signal::Sell
                } else {
                    Signal::Hold
                }
            }
        }
    }

    /// Stop price carried by an order raised for `signal` at the current bar.
    pub fn protective_stop(&self, history: &[Bar], view: &IndicatorView, signal: Signal) -> Option<f64> {
        match (*self, signal) {
            (
                Strategy::MaAtrStop {
                    atr_period,
                    atr_mult,
                    ..
                },
                Signal::Buy,
            ) => {
                let close = history.last()?.close;
                let atr = view.now(&IndicatorKey::Atr(atr_period))?;
                Some(close - atr_mult * atr)
            }
            _ => None,
        }
    }
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SMA" => Ok(Strategy::SmaCrossover {
                fast: DEFAULT_SMA_FAST,
                slow: DEFAULT_SMA_SLOW,
            }),
            "MACD" => Ok(Strategy::Macd(MacdParams::default())),
            "RSI" => Ok(Strategy::RsiMeanReversion {
                period: DEFAULT_RSI_PERIOD,
                oversold: DEFAULT_RSI_OVERSOLD,
                overbought: DEFAULT_RSI_OVERBOUGHT,
            }),
            "BB" => Ok(Strategy::BollingerBands {
                period: DEFAULT_BB_PERIOD,
                stddev_mult_x100: DEFAULT_BB_STDDEV_X100,
            }),
            "MAATR" => Ok(Strategy::MaAtrStop {
                ma_period: DEFAULT_MAATR_MA,
                atr_period: DEFAULT_MAATR_ATR,
                atr_mult: DEFAULT_MAATR_MULT,
            }),
            "VWAP" => Ok(Strategy::Vwap),
            "DMA" => Ok(Strategy::DualMaMacd {
                fast: DEFAULT_DMA_FAST,
                slow: DEFAULT_DMA_SLOW,
                macd: MacdParams::default(),
            }),
            _ => Err(ConfigError::UnknownStrategy {
                code: s.trim().to_string(),
            }),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `a[i-1] <= b[i-1] && a[i] > b[i]`; false when any value is missing.
pub fn crosses_above(view: &IndicatorView, a: &IndicatorKey, b: &IndicatorKey) -> bool {
    match (view.prev(a), view.prev(b), view.now(a), view.now(b)) {
        (Some(a_prev), Some(b_prev), Some(a_now), Some(b_now)) => {
            a_prev <= b_prev && a_now > b_now
        }
        _ => false,
    }
}

fn crossover_signal(up: bool, down: bool) -> Signal {
    if up {
        Signal::Buy
    } else if down {
        Signal::Sell
    } else {
        Signal::Hold
    }
}
