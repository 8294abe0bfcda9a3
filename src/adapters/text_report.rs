//! Plain-text summary and comparison tables for the terminal.

use std::io::Write;

use crate::domain::backtest::RunResult;
use crate::domain::comparison::{self, ComparisonRow, RunFailure};
use crate::domain::error::BacktestError;
use crate::domain::metrics::SummaryMetrics;
use crate::ports::report_port::ReportPort;

const COLUMNS: [&str; 8] = [
    "Strategy",
    "Return %",
    "Ann. Return %",
    "Max DD %",
    "Sharpe",
    "Win Rate %",
    "# Trades",
    "Profit Factor",
];

/// Writes reports to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextReportAdapter;

impl ReportPort for TextReportAdapter {
    fn write_run(&self, result: &RunResult, symbol: &str) -> Result<(), BacktestError> {
        let mut out = std::io::stdout().lock();
        out.write_all(render_summary(result, symbol).as_bytes())?;
        Ok(())
    }

    fn write_comparison(&self, results: &[RunResult], symbol: &str) -> Result<(), BacktestError> {
        let rows: Vec<ComparisonRow> = results.iter().map(ComparisonRow::from).collect();
        let mut out = std::io::stdout().lock();
        out.write_all(render_comparison(&comparison::rank(rows), symbol).as_bytes())?;
        Ok(())
    }
}

impl TextReportAdapter {
    /// List strategies whose run failed, one line each.
    pub fn write_failures(&self, failures: &[RunFailure]) -> Result<(), BacktestError> {
        if failures.is_empty() {
            return Ok(());
        }
        let mut out = std::io::stdout().lock();
        out.write_all(render_failures(failures).as_bytes())?;
        Ok(())
    }
}

/// Two decimals; `n/a` for NaN, `inf` for unbounded values.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else if value == f64::INFINITY {
        "inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{:.2}", value)
    }
}

pub fn render_summary(result: &RunResult, symbol: &str) -> String {
    let m = &result.metrics;
    let mut out = String::new();

    out.push_str(&format!("{} on {}\n", result.strategy.name(), symbol));
    if let (Some(first), Some(last)) = (result.equity_curve.first(), result.equity_curve.last()) {
        out.push_str(&format!(
            "  {:<18}{} .. {} ({} bars)\n",
            "Period",
            first.timestamp.format("%Y-%m-%d"),
            last.timestamp.format("%Y-%m-%d"),
            result.equity_curve.len()
        ));
    }

    let lines = [
        ("Final Equity", format_value(result.final_equity())),
        ("Return %", format_value(m.return_pct)),
        ("Ann. Return %", format_value(m.annualized_return_pct)),
        ("Buy & Hold %", format_value(m.buy_and_hold_return_pct)),
        ("Max DD %", format_value(m.max_drawdown_pct)),
        ("Sharpe", format_value(m.sharpe_ratio)),
        ("Win Rate %", format_value(m.win_rate_pct)),
        ("# Trades", m.trade_count.to_string()),
        ("Profit Factor", format_value(m.profit_factor)),
    ];
    for (label, value) in lines {
        out.push_str(&format!("  {:<18}{}\n", label, value));
    }

    let skipped = result.skipped_orders();
    if skipped > 0 {
        out.push_str(&format!("  {:<18}{}\n", "Skipped Orders", skipped));
    }
    if result.depleted() {
        out.push_str(&format!("  {:<18}{}\n", "Account", "depleted, trading stopped"));
    }
    out
}

fn metric_cells(m: &SummaryMetrics) -> [String; 7] {
    [
        format_value(m.return_pct),
        format_value(m.annualized_return_pct),
        format_value(m.max_drawdown_pct),
        format_value(m.sharpe_ratio),
        format_value(m.win_rate_pct),
        m.trade_count.to_string(),
        format_value(m.profit_factor),
    ]
}

/// Aligned table, one row per strategy in the order given.
pub fn render_comparison(rows: &[ComparisonRow], symbol: &str) -> String {
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let mut cells = vec![row.strategy.name().to_string()];
            cells.extend(metric_cells(&row.metrics));
            cells
        })
        .collect();

    let widths: Vec<usize> = COLUMNS
        .iter()
        .enumerate()
        .map(|(col, header)| {
            body.iter()
                .map(|cells| cells[col].len())
                .chain(std::iter::once(header.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_line = |cells: &[String]| -> String {
        let parts: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(col, cell)| {
                if col == 0 {
                    format!("{:<width$}", cell, width = widths[col])
                } else {
                    format!("{:>width$}", cell, width = widths[col])
                }
            })
            .collect();
        format!("{}\n", parts.join("  ").trim_end())
    };

    let header: Vec<String> = COLUMNS.iter().map(|c| c.to_string()).collect();
    let rule_len = widths.iter().sum::<usize>() + 2 * (widths.len() - 1);

    let mut out = format!("Strategy comparison on {}\n", symbol);
    out.push_str(&format_line(&header));
    out.push_str(&format!("{}\n", "-".repeat(rule_len)));
    for cells in &body {
        out.push_str(&format_line(cells));
    }
    out
}

pub fn render_failures(failures: &[RunFailure]) -> String {
    let width = failures
        .iter()
        .map(|f| f.strategy.name().len())
        .max()
        .unwrap_or(0);
    let mut out = String::from("Not run:\n");
    for failure in failures {
        out.push_str(&format!(
            "  {:<width$}  {}\n",
            failure.strategy.name(),
            failure.error,
            width = width
        ));
    }
    out
}
