#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use quantbench::domain::backtest::{BacktestConfig, PositionSizing};
use quantbench::domain::error::DataError;
use quantbench::domain::feed::DataFeed;
pub use quantbench::domain::ohlcv::Bar;
use quantbench::ports::data_port::DataPort;
use std::collections::HashMap;
use std::io::Write;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(DataError::Source {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.timestamp.date() >= start_date && b.timestamp.date() < end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub fn day(offset: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + chrono::Duration::days(offset)
}

pub fn make_bar(offset: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        timestamp: day(offset),
        open,
        high,
        low,
        close,
        volume: 1_000.0,
    }
}

/// Bars with open = previous close and a 1% range around the body.
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let high = open.max(close) * 1.01;
            let low = open.min(close) * 0.99;
            Bar {
                timestamp: day(i as i64),
                open,
                high,
                low,
                close,
                volume: 1_000.0 + (i % 7) as f64 * 100.0,
            }
        })
        .collect()
}

/// Deterministic oscillating trend, long enough for every default strategy.
pub fn wave_closes(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let t = i as f64;
            100.0 + 0.05 * t + 8.0 * (t / 9.0).sin() + 3.0 * (t / 2.3).cos()
        })
        .collect()
}

pub fn wave_feed(len: usize) -> DataFeed {
    DataFeed::new(make_bars(&wave_closes(len))).unwrap()
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        initial_cash: 10_000.0,
        commission_rate: 0.002,
        exclusive_orders: true,
        position_sizing: PositionSizing::FractionOfEquity(1.0),
    }
}

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Write `<dir>/<symbol>.csv` in the format the CSV adapter reads.
pub fn write_price_csv(dir: &std::path::Path, symbol: &str, bars: &[Bar]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    std::fs::write(dir.join(format!("{}.csv", symbol)), content).unwrap();
}
