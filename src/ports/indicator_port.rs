//! Indicator computation port trait.
//!
//! The backtest core only consumes an [`IndicatorFrame`]; how the series are
//! produced (builtin math, an external library, cached files) is up to the
//! adapter.

use std::collections::BTreeSet;

use crate::domain::feed::DataFeed;
use crate::domain::indicator::{IndicatorFrame, IndicatorKey};
use crate::domain::ohlcv::Bar;
use crate::domain::strategy::Strategy;

pub trait IndicatorPort {
    /// One value per bar; `None` until the indicator's lookback is satisfied.
    fn compute(&self, key: &IndicatorKey, bars: &[Bar]) -> Vec<Option<f64>>;

    /// Compute every series required by `strategies`, each exactly once.
    fn build_frame(&self, feed: &DataFeed, strategies: &[Strategy]) -> IndicatorFrame {
        let keys: BTreeSet<IndicatorKey> = strategies
            .iter()
            .flat_map(|s| s.requirements())
            .collect();

        let mut frame = IndicatorFrame::new();
        for key in keys {
            frame.insert(key, self.compute(&key, feed.bars()));
        }
        frame
    }
}
