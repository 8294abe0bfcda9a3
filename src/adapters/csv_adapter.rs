//! CSV file data adapter.
//!
//! Reads `<base_path>/<SYMBOL>.csv` with columns
//! `date,open,high,low,close,volume`. Dates may be `YYYY-MM-DD` or
//! `YYYY-MM-DD HH:MM:SS` for intraday series.

use crate::domain::error::DataError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn source_error(reason: String) -> DataError {
    DataError::Source { reason }
}

fn parse_timestamp(raw: &str, line: u64) -> Result<NaiveDateTime, DataError> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|e| source_error(format!("line {}: invalid date '{}': {}", line, raw, e)))
}

fn parse_field(record: &StringRecord, index: usize, name: &str, line: u64) -> Result<f64, DataError> {
    let raw = record
        .get(index)
        .ok_or_else(|| source_error(format!("line {}: missing {} column", line, name)))?;
    raw.trim()
        .parse()
        .map_err(|e| source_error(format!("line {}: invalid {} value '{}': {}", line, name, raw, e)))
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        let path = self.csv_path(symbol);
        let mut rdr = csv::Reader::from_path(&path)
            .map_err(|e| source_error(format!("failed to read {}: {}", path.display(), e)))?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| source_error(format!("CSV parse error: {}", e)))?;
            let line = record.position().map_or(0, |p| p.line());

            let date_str = record
                .get(0)
                .ok_or_else(|| source_error(format!("line {}: missing date column", line)))?;
            let timestamp = parse_timestamp(date_str, line)?;

            let date = timestamp.date();
            if date < start_date || date >= end_date {
                continue;
            }

            bars.push(Bar {
                timestamp,
                open: parse_field(&record, 1, "open", line)?,
                high: parse_field(&record, 2, "high", line)?,
                low: parse_field(&record, 3, "low", line)?,
                close: parse_field(&record, 4, "close", line)?,
                volume: parse_field(&record, 5, "volume", line)?,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        debug!(symbol, bars = bars.len(), path = %path.display(), "loaded price data");
        Ok(bars)
    }
}
