//! Simple and exponential moving averages over closing prices.

/// Arithmetic mean of the last `period` values; `None` for the first
/// `period - 1` bars.
pub fn calculate_sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            (i + 1 >= period).then(|| {
                let window = &values[i + 1 - period..=i];
                window.iter().sum::<f64>() / period as f64
            })
        })
        .collect()
}

/// EMA with `k = 2 / (n + 1)`, seeded by the SMA of the first `n` values.
pub fn calculate_ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(ema);

    for i in period..values.len() {
        ema = values[i] * k + ema * (1.0 - k);
        out[i] = Some(ema);
    }
    out
}
