//! Precomputed RSI / SuperTrend values keyed by candle timestamp.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use super::{Indicator, Rsi, Supertrend};
use crate::config::FilterConfig;
use crate::domain::Candle;
use crate::strategy::{IndicatorSource, TrendDirection};

/// Indicator values for one session, computed over warm-up candles
/// followed by the session's own candles.
#[derive(Debug, Clone, Default)]
pub struct IndicatorSeries {
    rsi: BTreeMap<NaiveDateTime, f64>,
    trend: BTreeMap<NaiveDateTime, TrendDirection>,
}

impl IndicatorSeries {
    /// `warmup` must precede `session` in time.
    pub fn compute(config: &FilterConfig, warmup: &[Candle], session: &[Candle]) -> Self {
        let candles: Vec<Candle> = warmup.iter().chain(session).cloned().collect();

        let rsi_values = Rsi::new(config.rsi_period).compute(&candles);
        let trend_values =
            Supertrend::new(config.supertrend_period, config.supertrend_multiplier).compute_trend(&candles);

        let mut series = Self::default();
        for ((candle, rsi), trend) in candles.iter().zip(rsi_values).zip(trend_values) {
            if !rsi.is_nan() {
                series.rsi.insert(candle.timestamp, rsi);
            }
            if let Some((_, direction)) = trend {
                series.trend.insert(candle.timestamp, direction);
            }
        }
        series
    }

    pub fn len(&self) -> usize {
        self.rsi.len().max(self.trend.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IndicatorSource for IndicatorSeries {
    fn rsi(&self, at: NaiveDateTime) -> Option<f64> {
        self.rsi.get(&at).copied()
    }

    fn supertrend(&self, at: NaiveDateTime) -> Option<TrendDirection> {
        self.trend.get(&at).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_candles;

    #[test]
    fn warmup_makes_values_available_from_first_session_candle() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i % 5) as f64).collect();
        let candles = make_candles(&closes);
        let (warmup, session) = candles.split_at(30);
        let series = IndicatorSeries::compute(&FilterConfig::default(), warmup, session);

        let first = session[0].timestamp;
        let rsi = series.rsi(first).unwrap();
        assert!((0.0..=100.0).contains(&rsi));
        assert!(series.supertrend(first).is_some());
    }

    #[test]
    fn no_warmup_leaves_early_candles_empty() {
        let candles = make_candles(&[100.0, 101.0, 102.0]);
        let series = IndicatorSeries::compute(&FilterConfig::default(), &[], &candles);
        assert!(series.rsi(candles[0].timestamp).is_none());
        assert!(series.is_empty());
    }
}
