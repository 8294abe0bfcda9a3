//! Performance metrics computed from a finished run.
//!
//! All percentages are reported as percent (e.g. `12.5` for 12.5%).

use chrono::{Datelike, NaiveDateTime, Weekday};

use super::feed::DataFeed;
use super::portfolio::EquityPoint;
use super::position::Trade;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const CALENDAR_DAYS_PER_YEAR: f64 = 365.0;
const WEEKS_PER_YEAR: f64 = 52.0;
const MONTHS_PER_YEAR: f64 = 12.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryMetrics {
    pub return_pct: f64,
    pub annualized_return_pct: f64,
    pub max_drawdown_pct: f64,
    pub sharpe_ratio: f64,
    pub win_rate_pct: f64,
    pub profit_factor: f64,
    pub buy_and_hold_return_pct: f64,
    pub trade_count: usize,
}

/// Summarize a run. `feed` supplies the elapsed time, bar spacing and the
/// buy & hold benchmark.
pub fn summarize(
    trades: &[Trade],
    equity_curve: &[EquityPoint],
    feed: &DataFeed,
    initial_cash: f64,
) -> SummaryMetrics {
    let final_equity = equity_curve
        .last()
        .map(|p| p.equity)
        .unwrap_or(initial_cash);

    let elapsed_days = elapsed_days(feed.first().timestamp, feed.last().timestamp);
    let periods = periods_per_year(&feed.timestamps());

    SummaryMetrics {
        return_pct: (final_equity / initial_cash - 1.0) * 100.0,
        annualized_return_pct: annualized_return_pct(initial_cash, final_equity, elapsed_days),
        max_drawdown_pct: max_drawdown_pct(equity_curve),
        sharpe_ratio: sharpe_ratio(equity_curve, periods),
        win_rate_pct: win_rate_pct(trades),
        profit_factor: profit_factor(trades),
        buy_and_hold_return_pct: buy_and_hold_return_pct(feed),
        trade_count: trades.len(),
    }
}

fn elapsed_days(first: NaiveDateTime, last: NaiveDateTime) -> f64 {
    (last - first).num_seconds() as f64 / SECONDS_PER_DAY
}

/// Compound annual growth over calendar days.
///
/// NaN when no time elapsed; -100 when the account was wiped out.
pub fn annualized_return_pct(initial: f64, final_equity: f64, elapsed_days: f64) -> f64 {
    if elapsed_days <= 0.0 {
        return f64::NAN;
    }
    if final_equity <= 0.0 {
        return -100.0;
    }
    ((final_equity / initial).powf(CALENDAR_DAYS_PER_YEAR / elapsed_days) - 1.0) * 100.0
}

/// Largest peak-to-trough decline, as a positive percentage of the peak.
pub fn max_drawdown_pct(equity_curve: &[EquityPoint]) -> f64 {
    let Some(first) = equity_curve.first() else {
        return 0.0;
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;

    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        } else if peak > 0.0 {
            let dd = (peak - point.equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd * 100.0
}

/// Annualized mean/stdev of per-bar equity returns (population stdev).
pub fn sharpe_ratio(equity_curve: &[EquityPoint], periods_per_year: f64) -> f64 {
    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            if prev > 0.0 {
                (w[1].equity - prev) / prev
            } else {
                0.0
            }
        })
        .collect();

    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev > 0.0 && stddev.is_finite() {
        mean / stddev * periods_per_year.sqrt()
    } else {
        0.0
    }
}

/// Bars per year, inferred from the median spacing between timestamps.
///
/// Daily feeds use 252 trading days, or 365 when weekend bars are present
/// (crypto-style calendars). Intraday feeds scale the daily figure by the
/// median number of bars per calendar date, so a 6.5-hour session of hourly
/// bars counts 7 periods a day rather than 24.
pub fn periods_per_year(timestamps: &[NaiveDateTime]) -> f64 {
    let mut spacings: Vec<f64> = timestamps
        .windows(2)
        .map(|w| elapsed_days(w[0], w[1]))
        .collect();

    if spacings.is_empty() {
        return TRADING_DAYS_PER_YEAR;
    }
    spacings.sort_by(f64::total_cmp);

    let mid = spacings.len() / 2;
    let median = if spacings.len() % 2 == 0 {
        (spacings[mid - 1] + spacings[mid]) / 2.0
    } else {
        spacings[mid]
    };

    let has_weekends = timestamps
        .iter()
        .any(|t| matches!(t.weekday(), Weekday::Sat | Weekday::Sun));
    let annual_days = if has_weekends {
        CALENDAR_DAYS_PER_YEAR
    } else {
        TRADING_DAYS_PER_YEAR
    };

    if median >= 28.0 {
        MONTHS_PER_YEAR
    } else if median >= 5.0 {
        WEEKS_PER_YEAR
    } else if median >= 1.0 {
        annual_days
    } else {
        annual_days * bars_per_session(timestamps)
    }
}

/// Median count of bars sharing a calendar date. Timestamps are ordered.
fn bars_per_session(timestamps: &[NaiveDateTime]) -> f64 {
    let mut counts: Vec<usize> = Vec::new();
    let mut current = None;
    for t in timestamps {
        let date = t.date();
        if current == Some(date) {
            if let Some(last) = counts.last_mut() {
                *last += 1;
            }
        } else {
            current = Some(date);
            counts.push(1);
        }
    }
    if counts.is_empty() {
        return 1.0;
    }
    counts.sort_unstable();

    let mid = counts.len() / 2;
    let median = if counts.len() % 2 == 0 {
        (counts[mid - 1] + counts[mid]) as f64 / 2.0
    } else {
        counts[mid] as f64
    };
    median.max(1.0)
}

pub fn win_rate_pct(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let wins = trades.iter().filter(|t| t.is_win()).count();
    wins as f64 / trades.len() as f64 * 100.0
}

/// Gross profit over gross loss.
///
/// Infinite when there are wins but no losses; zero with no wins.
pub fn profit_factor(trades: &[Trade]) -> f64 {
    let gross_win: f64 = trades.iter().filter(|t| t.is_win()).map(|t| t.pnl).sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.is_loss())
        .map(|t| t.pnl.abs())
        .sum();

    if gross_win <= 0.0 {
        0.0
    } else if gross_loss > 0.0 {
        gross_win / gross_loss
    } else {
        f64::INFINITY
    }
}

/// Return of holding the instrument from the first close to the last.
pub fn buy_and_hold_return_pct(feed: &DataFeed) -> f64 {
    let first = feed.first().close;
    if first == 0.0 {
        return f64::NAN;
    }
    (feed.last().close / first - 1.0) * 100.0
}
