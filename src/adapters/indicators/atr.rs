//! Average True Range with Wilder's smoothing.
//!
//! True range needs the previous close, so the first TR is at bar 1. The seed
//! is the mean of TR over bars `1..=n`; the first ATR is at bar `n`.

use crate::domain::ohlcv::Bar;

pub fn calculate_atr(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; bars.len()];
    if period == 0 || bars.len() <= period {
        return out;
    }

    let tr: Vec<f64> = bars
        .windows(2)
        .map(|w| w[1].true_range(w[0].close))
        .collect();

    let n = period as f64;
    let mut atr = tr[..period].iter().sum::<f64>() / n;
    out[period] = Some(atr);

    for i in (period + 1)..bars.len() {
        atr = (atr * (n - 1.0) + tr[i - 1]) / n;
        out[i] = Some(atr);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_bar(day: i64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                + chrono::Duration::days(day),
            open: close,
            high,
            low,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn atr_seed_and_smoothing() {
        let bars = vec![
            make_bar(0, 11.0, 9.0, 10.0),
            // TR = max(2, |12-10|, |10-10|) = 2
            make_bar(1, 12.0, 10.0, 11.0),
            // TR = max(1, |12-11|, |11-11|) = 1
            make_bar(2, 12.0, 11.0, 11.5),
            // gap up: TR = max(1, |15-11.5|, |14-11.5|) = 3.5
            make_bar(3, 15.0, 14.0, 14.5),
        ];
        let atr = calculate_atr(&bars, 2);
        assert_eq!(atr[0], None);
        assert_eq!(atr[1], None);
        assert_relative_eq!(atr[2].unwrap(), 1.5);
        assert_relative_eq!(atr[3].unwrap(), (1.5 + 3.5) / 2.0);
    }

    #[test]
    fn atr_short_input() {
        let bars = vec![make_bar(0, 11.0, 9.0, 10.0), make_bar(1, 11.0, 9.0, 10.0)];
        assert!(calculate_atr(&bars, 2).iter().all(Option::is_none));
    }
}
