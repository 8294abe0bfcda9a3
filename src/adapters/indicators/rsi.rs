//! RSI with Wilder's smoothing.
//!
//! The first average gain/loss is the simple mean of the first `n` price
//! changes; later ones use `avg = (prev * (n - 1) + current) / n`.
//! `RSI = 100 - 100 / (1 + avg_gain / avg_loss)`, or 100 when there are no
//! losses. First value at bar `n`.

pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return out;
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let gain = |c: f64| c.max(0.0);
    let loss = |c: f64| (-c).max(0.0);

    let n = period as f64;
    let mut avg_gain = changes[..period].iter().map(|&c| gain(c)).sum::<f64>() / n;
    let mut avg_loss = changes[..period].iter().map(|&c| loss(c)).sum::<f64>() / n;
    out[period] = Some(rsi_value(avg_gain, avg_loss));

    for i in (period + 1)..closes.len() {
        let change = changes[i - 1];
        avg_gain = (avg_gain * (n - 1.0) + gain(change)) / n;
        avg_loss = (avg_loss * (n - 1.0) + loss(change)) / n;
        out[i] = Some(rsi_value(avg_gain, avg_loss));
    }
    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
