//! Report output port trait.

use crate::domain::backtest::RunResult;
use crate::domain::error::BacktestError;

/// Port for writing backtest results somewhere outside the core.
pub trait ReportPort {
    fn write_run(&self, result: &RunResult, symbol: &str) -> Result<(), BacktestError>;

    /// Default implementation: one `write_run` per result, in order.
    fn write_comparison(&self, results: &[RunResult], symbol: &str) -> Result<(), BacktestError> {
        for result in results {
            self.write_run(result, symbol)?;
        }
        Ok(())
    }
}
