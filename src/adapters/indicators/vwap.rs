//! Cumulative volume-weighted average of the typical price over the series.

use crate::domain::ohlcv::Bar;

pub fn calculate_vwap(bars: &[Bar]) -> Vec<Option<f64>> {
    let mut price_volume = 0.0;
    let mut volume = 0.0;
    bars.iter()
        .map(|bar| {
            price_volume += bar.typical_price() * bar.volume;
            volume += bar.volume;
            (volume > 0.0).then(|| price_volume / volume)
        })
        .collect()
}
