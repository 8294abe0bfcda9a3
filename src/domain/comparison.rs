//! Side-by-side evaluation of several strategies over one feed.
//!
//! Each strategy gets its own account, trade log and equity curve; the feed
//! and indicator frame are shared read-only. Runs execute on the rayon pool
//! unless parallelism is turned off, and all observe one cancellation flag.
//! A run that fails (too few bars for its warmup, say) is reported next to
//! the others; only cancellation aborts the whole comparison.

use std::cmp::Ordering;
use std::sync::atomic::{self, AtomicBool};

use rayon::prelude::*;
use tracing::warn;

use super::backtest::{self, BacktestConfig, RunResult};
use super::error::BacktestError;
use super::feed::DataFeed;
use super::indicator::IndicatorFrame;
use super::metrics::SummaryMetrics;
use super::strategy::Strategy;

/// One line of the comparison table.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub strategy: Strategy,
    pub metrics: SummaryMetrics,
}

impl From<&RunResult> for ComparisonRow {
    fn from(result: &RunResult) -> Self {
        ComparisonRow {
            strategy: result.strategy,
            metrics: result.metrics.clone(),
        }
    }
}

/// A strategy whose run failed, kept so it can be reported.
#[derive(Debug)]
pub struct RunFailure {
    pub strategy: Strategy,
    pub error: BacktestError,
}

/// Results of a comparison. Both lists keep the input order.
#[derive(Debug, Default)]
pub struct ComparisonOutcome {
    pub results: Vec<RunResult>,
    pub failures: Vec<RunFailure>,
}

pub struct StrategyComparison<'a> {
    feed: &'a DataFeed,
    frame: &'a IndicatorFrame,
    config: &'a BacktestConfig,
    parallel: bool,
}

impl<'a> StrategyComparison<'a> {
    pub fn new(feed: &'a DataFeed, frame: &'a IndicatorFrame, config: &'a BacktestConfig) -> Self {
        Self {
            feed,
            frame,
            config,
            parallel: true,
        }
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run every strategy. Each run succeeds or fails on its own; the call
    /// only errors when the cancellation flag was raised.
    pub fn run_all(
        &self,
        strategies: &[Strategy],
        cancel: &AtomicBool,
    ) -> Result<ComparisonOutcome, BacktestError> {
        let run_one = |strategy: &Strategy| {
            (
                *strategy,
                backtest::run_with_cancel(self.feed, self.frame, strategy, self.config, cancel),
            )
        };

        let runs: Vec<(Strategy, Result<RunResult, BacktestError>)> = if self.parallel {
            strategies.par_iter().map(run_one).collect()
        } else {
            strategies.iter().map(run_one).collect()
        };

        if cancel.load(atomic::Ordering::Relaxed) {
            return Err(BacktestError::Cancelled);
        }

        let mut outcome = ComparisonOutcome::default();
        for (strategy, run) in runs {
            match run {
                Ok(result) => outcome.results.push(result),
                Err(BacktestError::Cancelled) => return Err(BacktestError::Cancelled),
                Err(error) => {
                    warn!(strategy = strategy.code(), %error, "strategy run failed");
                    outcome.failures.push(RunFailure { strategy, error });
                }
            }
        }
        Ok(outcome)
    }
}

/// Order rows by return, best first. NaN returns sort last; ties fall back
/// to the strategy code so the table is stable.
pub fn rank(mut rows: Vec<ComparisonRow>) -> Vec<ComparisonRow> {
    rows.sort_by(compare_rows);
    rows
}

fn compare_rows(a: &ComparisonRow, b: &ComparisonRow) -> Ordering {
    let (ra, rb) = (a.metrics.return_pct, b.metrics.return_pct);
    let by_return = match (ra.is_nan(), rb.is_nan()) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (true, true) => Ordering::Equal,
        (false, false) => rb.total_cmp(&ra),
    };
    by_return.then_with(|| a.strategy.code().cmp(b.strategy.code()))
}
