//! Cost model — pure function from a closed round trip to itemised fees.
//!
//! Rates are configuration, not constants: a different broker or exchange
//! schedule is a different `CostSchedule`, never a code change.

use serde::{Deserialize, Serialize};

use crate::domain::FeesBreakdown;
use crate::error::ConfigError;

/// Fee schedule for one option round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostSchedule {
    /// Flat brokerage charged per order.
    pub brokerage_per_order: f64,
    /// Securities transaction tax on sell-side notional.
    pub stt_rate: f64,
    /// Exchange transaction charge on notional of both legs.
    pub exchange_rate: f64,
    /// GST applied to brokerage + exchange charge.
    pub gst_rate: f64,
    /// SEBI turnover fee on notional of both legs.
    pub sebi_rate: f64,
    /// Stamp duty on buy-side notional.
    pub stamp_rate: f64,
}

impl Default for CostSchedule {
    fn default() -> Self {
        Self {
            brokerage_per_order: 20.0,
            stt_rate: 0.001,
            exchange_rate: 0.000_350_3,
            gst_rate: 0.18,
            sebi_rate: 0.000_001,
            stamp_rate: 0.000_03,
        }
    }
}

impl CostSchedule {
    /// A schedule with every charge set to zero.
    pub fn free() -> Self {
        Self {
            brokerage_per_order: 0.0,
            stt_rate: 0.0,
            exchange_rate: 0.0,
            gst_rate: 0.0,
            sebi_rate: 0.0,
            stamp_rate: 0.0,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("brokerage_per_order", self.brokerage_per_order),
            ("stt_rate", self.stt_rate),
            ("exchange_rate", self.exchange_rate),
            ("gst_rate", self.gst_rate),
            ("sebi_rate", self.sebi_rate),
            ("stamp_rate", self.stamp_rate),
        ];
        for (field, value) in fields {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(ConfigError::Negative { field, value });
            }
        }
        Ok(())
    }
}

/// Fees for a bought-then-sold option position.
///
/// `quantity` is the number of option units (lots × lot size) and
/// `leg_count` the number of orders placed (2 for a plain round trip).
/// Every component is non-negative for non-negative premiums.
pub fn compute_costs(
    schedule: &CostSchedule,
    entry_premium: f64,
    exit_premium: f64,
    quantity: u32,
    leg_count: u32,
) -> FeesBreakdown {
    let qty = f64::from(quantity);
    let buy_notional = entry_premium.max(0.0) * qty;
    let sell_notional = exit_premium.max(0.0) * qty;
    let turnover = buy_notional + sell_notional;

    let brokerage = schedule.brokerage_per_order * f64::from(leg_count);
    let exchange = turnover * schedule.exchange_rate;

    FeesBreakdown {
        brokerage,
        stt: sell_notional * schedule.stt_rate,
        exchange,
        gst: (brokerage + exchange) * schedule.gst_rate,
        sebi: turnover * schedule.sebi_rate,
        stamp_duty: buy_notional * schedule.stamp_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn default_schedule_itemises_each_charge() {
        // entry 100, exit 120, 25 units → buy 2500, sell 3000, turnover 5500
        let fees = compute_costs(&CostSchedule::default(), 100.0, 120.0, 25, 2);
        approx(fees.brokerage, 40.0);
        approx(fees.stt, 3.0);
        approx(fees.exchange, 5500.0 * 0.000_350_3);
        approx(fees.gst, (40.0 + 5500.0 * 0.000_350_3) * 0.18);
        approx(fees.sebi, 0.0055);
        approx(fees.stamp_duty, 0.075);
        assert!(fees.total() > 40.0);
    }

    #[test]
    fn free_schedule_costs_nothing() {
        let fees = compute_costs(&CostSchedule::free(), 100.0, 50.0, 75, 2);
        assert_eq!(fees.total(), 0.0);
    }

    #[test]
    fn brokerage_scales_with_leg_count() {
        let fees = compute_costs(&CostSchedule::default(), 0.0, 0.0, 25, 4);
        approx(fees.brokerage, 80.0);
        approx(fees.total(), 80.0 * 1.18);
    }

    #[test]
    fn negative_rate_is_rejected() {
        let schedule = CostSchedule {
            stt_rate: -0.001,
            ..CostSchedule::default()
        };
        assert!(matches!(
            schedule.validate(),
            Err(ConfigError::Negative { field: "stt_rate", .. })
        ));
    }
}
