//! Backtest engine and bar loop.
//!
//! [`run`] replays a validated feed one bar at a time. Orders raised at the
//! close of bar `i` fill at the open of bar `i + 1`; stops are checked against
//! each bar's range; any position still open after the last bar is closed at
//! its close. Once equity at a close is zero or less the position is
//! liquidated, cash is floored at zero and the account stops trading. The
//! loop never prints and never reads past the current bar.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use super::error::{BacktestError, ConfigError, DataError};
use super::execution::{self, OrderRequest, Side};
use super::feed::DataFeed;
use super::indicator::{IndicatorFrame, IndicatorView};
use super::metrics::{self, SummaryMetrics};
use super::portfolio::{Account, EquityPoint};
use super::position::{ExitReason, Trade};
use super::strategy::{Signal, Strategy};

/// How many units a new position takes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionSizing {
    /// Spend this fraction of current equity on whole units.
    FractionOfEquity(f64),
    /// Always trade this many units.
    FixedUnits(f64),
}

impl Default for PositionSizing {
    fn default() -> Self {
        PositionSizing::FractionOfEquity(1.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_cash: f64,
    pub commission_rate: f64,
    pub exclusive_orders: bool,
    pub position_sizing: PositionSizing,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_cash: 10_000.0,
            commission_rate: 0.002,
            exclusive_orders: true,
            position_sizing: PositionSizing::default(),
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.initial_cash.is_finite() || self.initial_cash <= 0.0 {
            return Err(ConfigError::NonPositiveInitialCash {
                value: self.initial_cash,
            });
        }
        if !self.commission_rate.is_finite() || self.commission_rate < 0.0 {
            return Err(ConfigError::NegativeCommission {
                value: self.commission_rate,
            });
        }
        if !self.exclusive_orders {
            return Err(ConfigError::ExclusiveOrdersRequired);
        }
        match self.position_sizing {
            PositionSizing::FractionOfEquity(f) if !(f.is_finite() && f > 0.0 && f <= 1.0) => {
                Err(ConfigError::InvalidPositionSizing {
                    reason: format!("fraction must be in (0, 1], got {}", f),
                })
            }
            PositionSizing::FixedUnits(u) if !(u.is_finite() && u > 0.0) => {
                Err(ConfigError::InvalidPositionSizing {
                    reason: format!("units must be positive, got {}", u),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Why an order was not executed.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    InsufficientCash { required: f64, available: f64 },
    StopBeyondFill { stop: f64, fill: f64 },
}

/// Recoverable conditions observed during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    SkippedOrder {
        index: usize,
        side: Side,
        reason: SkipReason,
    },
    /// A signal on the final bar has no next open to fill at.
    OrderDroppedAtEnd { index: usize, side: Side },
    /// A required indicator had no value at a bar past warmup.
    IndicatorNotReady { index: usize },
    /// Equity reached zero; the position was liquidated and trading stopped.
    AccountDepleted { index: usize, equity: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub strategy: Strategy,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub metrics: SummaryMetrics,
    pub events: Vec<EngineEvent>,
}

impl RunResult {
    pub fn final_equity(&self) -> f64 {
        self.equity_curve.last().map_or(0.0, |p| p.equity)
    }

    pub fn depleted(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, EngineEvent::AccountDepleted { .. }))
    }

    pub fn skipped_orders(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, EngineEvent::SkippedOrder { .. }))
            .count()
    }
}

/// Run `strategy` over `feed` with pre-computed `frame`.
pub fn run(
    feed: &DataFeed,
    frame: &IndicatorFrame,
    strategy: &Strategy,
    config: &BacktestConfig,
) -> Result<RunResult, BacktestError> {
    run_with_cancel(feed, frame, strategy, config, &AtomicBool::new(false))
}

/// Like [`run`], but stops between bars once `cancel` is set.
pub fn run_with_cancel(
    feed: &DataFeed,
    frame: &IndicatorFrame,
    strategy: &Strategy,
    config: &BacktestConfig,
    cancel: &AtomicBool,
) -> Result<RunResult, BacktestError> {
    config.validate()?;
    strategy.validate()?;

    let minimum = strategy.min_bars();
    if feed.len() < minimum {
        return Err(DataError::InsufficientData {
            bars: feed.len(),
            minimum,
        }
        .into());
    }
    frame.validate(&strategy.requirements(), feed.len())?;

    let bars = feed.bars();
    let last_index = bars.len() - 1;
    let warmup = strategy.warmup_offset();

    let mut account = Account::new(config.initial_cash);
    let mut pending: Option<OrderRequest> = None;
    let mut trades = Vec::new();
    let mut equity_curve = Vec::with_capacity(bars.len());
    let mut events = Vec::new();
    let mut depleted = false;

    debug!(strategy = strategy.code(), bars = bars.len(), warmup, "backtest started");

    for (i, bar) in bars.iter().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            info!(strategy = strategy.code(), index = i, "backtest cancelled");
            return Err(BacktestError::Cancelled);
        }

        if let Some(order) = pending.take() {
            let applied = execution::apply(&order, i, bar.open, &account, config);
            account = applied.account;
            trades.extend(applied.trade);
            events.extend(applied.events);
        }

        if depleted {
            equity_curve.push(account.mark(i, bar.timestamp, bar.close));
            continue;
        }

        if let Some(trade) = execution::check_stop(&mut account, i, bar, config) {
            trades.push(trade);
        }

        let equity = account.equity(bar.close);
        if equity <= 0.0 {
            let closed = execution::close_position(
                &mut account,
                i,
                bar.close,
                ExitReason::Liquidation,
                config,
            );
            trades.extend(closed);
            account.cash = account.cash.max(0.0);
            depleted = true;
            warn!(
                strategy = strategy.code(),
                index = i,
                equity,
                "account depleted, trading stopped"
            );
            events.push(EngineEvent::AccountDepleted { index: i, equity });
            equity_curve.push(account.mark(i, bar.timestamp, bar.close));
            continue;
        }

        if i >= warmup {
            let history = &bars[..=i];
            let view = IndicatorView::new(frame, i);
            if !strategy.is_ready(&view) {
                events.push(EngineEvent::IndicatorNotReady { index: i });
            }

            let signal = strategy.decide(history, &view);
            let side = match signal {
                Signal::Buy => Some(Side::Buy),
                Signal::Sell => Some(Side::Sell),
                Signal::Hold => None,
            };

            if let Some(side) = side {
                if i == last_index {
                    events.push(EngineEvent::OrderDroppedAtEnd { index: i, side });
                } else {
                    pending = Some(OrderRequest {
                        side,
                        stop_price: strategy.protective_stop(history, &view, signal),
                        signal_index: i,
                    });
                }
            }
        }

        if i == last_index {
            let closed =
                execution::close_position(&mut account, i, bar.close, ExitReason::Signal, config);
            trades.extend(closed);
        }

        equity_curve.push(account.mark(i, bar.timestamp, bar.close));
    }

    let metrics = metrics::summarize(&trades, &equity_curve, feed, config.initial_cash);

    info!(
        strategy = strategy.code(),
        trades = trades.len(),
        return_pct = metrics.return_pct,
        events = events.len(),
        "backtest finished"
    );

    Ok(RunResult {
        strategy: *strategy,
        trades,
        equity_curve,
        metrics,
        events,
    })
}
