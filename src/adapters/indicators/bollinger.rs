//! Bollinger Bands: SMA(n) plus or minus `k` population standard deviations.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Upper,
    Lower,
}

pub fn calculate_bollinger(
    closes: &[f64],
    period: usize,
    stddev_mult_x100: u32,
    band: Band,
) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }
    let mult = stddev_mult_x100 as f64 / 100.0;
    let sign = match band {
        Band::Upper => 1.0,
        Band::Lower => -1.0,
    };

    (0..closes.len())
        .map(|i| {
            (i + 1 >= period).then(|| {
                let window = &closes[i + 1 - period..=i];
                let middle = window.iter().sum::<f64>() / period as f64;
                let variance = window.iter().map(|c| (c - middle).powi(2)).sum::<f64>()
                    / period as f64;
                middle + sign * mult * variance.sqrt()
            })
        })
        .collect()
}
