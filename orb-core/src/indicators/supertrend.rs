//! Supertrend — ATR-band trend state.
//!
//! Inherently sequential: the trend flips between support (lower band) and
//! resistance (upper band) on close-vs-band comparisons.
//!
//! Lookback: period (the ATR seed).

use super::atr::{true_range, wilder_smooth};
use super::Indicator;
use crate::domain::Candle;
use crate::strategy::TrendDirection;

#[derive(Debug, Clone)]
pub struct Supertrend {
    period: usize,
    multiplier: f64,
    name: String,
}

impl Supertrend {
    /// `period` must be >= 1 (enforced by config validation).
    pub fn new(period: usize, multiplier: f64) -> Self {
        let period = period.max(1);
        Self {
            period,
            multiplier,
            name: format!("supertrend_{period}_{multiplier}"),
        }
    }

    /// Active band and trend per candle; `None` during warm-up.
    pub fn compute_trend(&self, candles: &[Candle]) -> Vec<Option<(f64, TrendDirection)>> {
        let n = candles.len();
        let mut result = vec![None; n];

        let atr = wilder_smooth(&true_range(candles), self.period);
        let Some(start) = atr.iter().position(|v| !v.is_nan()) else {
            return result;
        };

        let hl2 = (candles[start].high + candles[start].low) / 2.0;
        let mut upper_band = hl2 + self.multiplier * atr[start];
        let mut lower_band = hl2 - self.multiplier * atr[start];
        let mut trending_up = true;
        result[start] = Some((lower_band, TrendDirection::Up));

        for i in (start + 1)..n {
            if atr[i].is_nan() {
                break;
            }
            let hl2 = (candles[i].high + candles[i].low) / 2.0;
            let basic_upper = hl2 + self.multiplier * atr[i];
            let basic_lower = hl2 - self.multiplier * atr[i];
            let prev_close = candles[i - 1].close;

            // Upper band can only decrease while price stays below it
            upper_band = if prev_close <= upper_band {
                basic_upper.min(upper_band)
            } else {
                basic_upper
            };
            // Lower band can only increase while price stays above it
            lower_band = if prev_close >= lower_band {
                basic_lower.max(lower_band)
            } else {
                basic_lower
            };

            let close = candles[i].close;
            if trending_up && close < lower_band {
                trending_up = false;
            } else if !trending_up && close > upper_band {
                trending_up = true;
            }

            result[i] = Some(if trending_up {
                (lower_band, TrendDirection::Up)
            } else {
                (upper_band, TrendDirection::Down)
            });
        }

        result
    }
}

impl Indicator for Supertrend {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        self.compute_trend(candles)
            .into_iter()
            .map(|v| v.map_or(f64::NAN, |(band, _)| band))
            .collect()
    }
}
