//! Validated, time-ordered price feed.
//!
//! A [`DataFeed`] can only be built from bars that pass validation, so the
//! simulator never has to re-check ordering or finiteness inside its loop.

use super::error::DataError;
use super::ohlcv::Bar;
use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct DataFeed {
    bars: Vec<Bar>,
}

impl DataFeed {
    /// Validate and wrap a bar sequence.
    ///
    /// Rejects empty feeds, non-increasing timestamps, non-finite prices and
    /// negative or non-finite volume.
    pub fn new(bars: Vec<Bar>) -> Result<Self, DataError> {
        if bars.is_empty() {
            return Err(DataError::EmptyFeed);
        }

        for (index, bar) in bars.iter().enumerate() {
            validate_bar(index, bar)?;
            if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
                return Err(DataError::NonMonotonicTimestamp {
                    index,
                    timestamp: bar.timestamp,
                });
            }
        }

        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> &Bar {
        &self.bars[0]
    }

    pub fn last(&self) -> &Bar {
        &self.bars[self.bars.len() - 1]
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }
}

fn validate_bar(index: usize, bar: &Bar) -> Result<(), DataError> {
    let fields = [
        ("open", bar.open),
        ("high", bar.high),
        ("low", bar.low),
        ("close", bar.close),
    ];
    for (field, value) in fields {
        if !value.is_finite() {
            return Err(DataError::NonFinitePrice { index, field });
        }
    }
    if !bar.volume.is_finite() || bar.volume < 0.0 {
        return Err(DataError::InvalidVolume {
            index,
            value: bar.volume,
        });
    }
    Ok(())
}
