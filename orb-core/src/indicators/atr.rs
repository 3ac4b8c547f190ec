//! True range and Wilder smoothing (the ATR building blocks).

use crate::domain::Candle;

/// True Range series.
/// TR[0] = high[0] - low[0] (no previous close).
/// TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    let mut tr = vec![f64::NAN; candles.len()];
    let Some(first) = candles.first() else {
        return tr;
    };
    tr[0] = first.high - first.low;

    for i in 1..candles.len() {
        let h = candles[i].high;
        let l = candles[i].low;
        let pc = candles[i - 1].close;
        tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
    }
    tr
}

/// Wilder smoothing with alpha = 1/period, seeded by the mean of the first
/// `period` consecutive valid values. A NaN after the seed ends the series.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let Some(seed_start) = (0..=n - period).find(|&i| values[i..i + period].iter().all(|v| !v.is_nan()))
    else {
        return result;
    };
    let seed_end = seed_start + period;
    let mut prev = values[seed_start..seed_end].iter().sum::<f64>() / period as f64;
    result[seed_end - 1] = prev;

    let alpha = 1.0 / period as f64;
    for i in seed_end..n {
        if values[i].is_nan() {
            return result;
        }
        prev = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = prev;
    }
    result
}
