//! CSV export of the trade log and equity curve.
//!
//! For each run, writes `<SYMBOL>_<CODE>_trades.csv` and
//! `<SYMBOL>_<CODE>_equity.csv` into the output directory.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::backtest::RunResult;
use crate::domain::error::{BacktestError, DataError};
use crate::ports::report_port::ReportPort;

pub struct TradeLogAdapter {
    output_dir: PathBuf,
}

impl TradeLogAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    fn path_for(&self, symbol: &str, code: &str, kind: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}_{}.csv", symbol, code, kind))
    }
}

fn csv_error(path: &Path, err: csv::Error) -> BacktestError {
    match err.into_kind() {
        csv::ErrorKind::Io(io) => BacktestError::Io(io),
        other => DataError::Source {
            reason: format!("failed to write {}: {:?}", path.display(), other),
        }
        .into(),
    }
}

impl ReportPort for TradeLogAdapter {
    fn write_run(&self, result: &RunResult, symbol: &str) -> Result<(), BacktestError> {
        std::fs::create_dir_all(&self.output_dir)?;
        let code = result.strategy.code();

        let trades_path = self.path_for(symbol, code, "trades");
        let mut wtr = csv::Writer::from_path(&trades_path).map_err(|e| csv_error(&trades_path, e))?;
        wtr.write_record([
            "entry_index",
            "exit_index",
            "direction",
            "entry_price",
            "exit_price",
            "size",
            "pnl",
            "pnl_pct",
            "commission",
            "exit_reason",
        ])
        .map_err(|e| csv_error(&trades_path, e))?;
        for t in &result.trades {
            wtr.write_record([
                t.entry_index.to_string(),
                t.exit_index.to_string(),
                t.direction.to_string(),
                t.entry_price.to_string(),
                t.exit_price.to_string(),
                t.size.to_string(),
                t.pnl.to_string(),
                t.pnl_pct.to_string(),
                t.commission.to_string(),
                t.exit_reason.to_string(),
            ])
            .map_err(|e| csv_error(&trades_path, e))?;
        }
        wtr.flush()?;

        let equity_path = self.path_for(symbol, code, "equity");
        let mut wtr = csv::Writer::from_path(&equity_path).map_err(|e| csv_error(&equity_path, e))?;
        wtr.write_record(["timestamp", "cash", "position_value", "equity", "direction"])
            .map_err(|e| csv_error(&equity_path, e))?;
        for p in &result.equity_curve {
            wtr.write_record([
                p.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                p.cash.to_string(),
                p.position_value.to_string(),
                p.equity.to_string(),
                p.direction.to_string(),
            ])
            .map_err(|e| csv_error(&equity_path, e))?;
        }
        wtr.flush()?;

        info!(
            symbol,
            strategy = code,
            trades = result.trades.len(),
            dir = %self.output_dir.display(),
            "trade log written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::{self, BacktestConfig, PositionSizing};
    use crate::domain::feed::DataFeed;
    use crate::domain::indicator::{IndicatorFrame, IndicatorKey};
    use crate::domain::ohlcv::Bar;
    use crate::domain::strategy::Strategy;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample_result() -> RunResult {
        let bars: Vec<Bar> = [10.0, 12.0, 11.0, 13.0]
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: NaiveDate::from_ymd_opt(2024, 2, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
                    + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 10.0,
            })
            .collect();
        let feed = DataFeed::new(bars).unwrap();
        let frame = IndicatorFrame::new().with_series(IndicatorKey::Vwap, vec![Some(9.0); 4]);
        let config = BacktestConfig {
            position_sizing: PositionSizing::FixedUnits(1.0),
            ..BacktestConfig::default()
        };
        backtest::run(&feed, &frame, &Strategy::Vwap, &config).unwrap()
    }

    #[test]
    fn writes_trades_and_equity_files() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("logs");
        let adapter = TradeLogAdapter::new(out.clone());
        let result = sample_result();

        adapter.write_run(&result, "NVDA").unwrap();

        let trades = std::fs::read_to_string(out.join("NVDA_VWAP_trades.csv")).unwrap();
        let trade_lines: Vec<&str> = trades.lines().collect();
        assert!(trade_lines[0].starts_with("entry_index,exit_index,direction"));
        assert_eq!(trade_lines.len(), 1 + result.trades.len());
        assert!(trade_lines[1].contains("long"));

        let equity = std::fs::read_to_string(out.join("NVDA_VWAP_equity.csv")).unwrap();
        assert_eq!(equity.lines().count(), 1 + result.equity_curve.len());
        assert!(equity.lines().nth(1).unwrap().starts_with("2024-02-01 00:00:00"));
    }

    #[test]
    fn write_comparison_writes_each_run() {
        let dir = TempDir::new().unwrap();
        let adapter = TradeLogAdapter::new(dir.path().to_path_buf());
        let result = sample_result();

        adapter
            .write_comparison(&[result.clone(), result], "X")
            .unwrap();

        assert!(dir.path().join("X_VWAP_trades.csv").exists());
        assert!(dir.path().join("X_VWAP_equity.csv").exists());
    }
}
