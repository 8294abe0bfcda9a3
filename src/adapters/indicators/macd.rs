//! MACD line and signal.
//!
//! Line = EMA(fast) - EMA(slow); signal = EMA(signal) of the line, seeded
//! once the slow EMA exists. Both series are reported from the first bar the
//! signal is defined so crossover rules always compare two real values.

use super::moving_average::calculate_ema;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdOutput {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
}

pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdOutput {
    let len = closes.len();
    let mut output = MacdOutput {
        line: vec![None; len],
        signal: vec![None; len],
    };
    if fast == 0 || slow == 0 || signal == 0 || len < slow {
        return output;
    }

    let ema_fast = calculate_ema(closes, fast);
    let ema_slow = calculate_ema(closes, slow);

    let line_start = slow.max(fast) - 1;
    let raw_line: Vec<f64> = (line_start..len)
        .map(|i| match (ema_fast[i], ema_slow[i]) {
            (Some(f), Some(s)) => f - s,
            _ => 0.0,
        })
        .collect();
    let signal_line = calculate_ema(&raw_line, signal);

    for (offset, sig) in signal_line.into_iter().enumerate() {
        if let Some(sig) = sig {
            let i = line_start + offset;
            output.line[i] = Some(raw_line[offset]);
            output.signal[i] = Some(sig);
        }
    }
    output
}
