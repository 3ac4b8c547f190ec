//! Indicator series for the entry filter.
//!
//! Indicators are pure functions: candle history in, numeric series out.
//! They are computed once per day over warm-up + session candles and
//! exposed to the engine through `IndicatorSeries`, an `IndicatorSource`.

pub mod atr;
pub mod rsi;
pub mod series;
pub mod supertrend;

pub use rsi::Rsi;
pub use series::IndicatorSeries;
pub use supertrend::Supertrend;

use crate::domain::Candle;

/// Trait for indicators.
///
/// Output has the same length as the input; warm-up values are `f64::NAN`.
/// No value at index t may depend on candles after t.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "rsi_14").
    fn name(&self) -> &str;

    /// Number of candles needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    fn compute(&self, candles: &[Candle]) -> Vec<f64>;
}

/// Synthetic one-minute candles from close prices, for tests.
///
/// open = previous close, high/low = max/min(open, close) ± 1.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(9, 15, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle::new(
                start + chrono::Duration::minutes(i as i64),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
            )
        })
        .collect()
}

#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}
