//! Risk-fraction sizer
//!
//! Lot size such that hitting the stop loses a fixed fraction of the balance,
//! then scaled by leverage.

use super::SizingError;

/// Fixed-fractional risk sizer.
///
/// # Formula
/// ```text
/// risk_amount = balance * risk_fraction
/// lots        = risk_amount / (stop_loss_pips * pip_value)
/// size        = round(lots * leverage, 2)
/// ```
///
/// # Example
/// - Balance: 1000
/// - Risk per trade: 10% (100)
/// - Stop: 20 pips at 10 per pip per lot (200 per lot)
/// - Size: 100 / 200 = 0.50 lots
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskSizer {
    /// Account value of one pip for one lot.
    pip_value: f64,
}

impl RiskSizer {
    pub fn new(pip_value: f64) -> Self {
        assert!(pip_value > 0.0, "pip_value must be > 0");
        Self { pip_value }
    }

    /// Lot size for one trade, rounded to hundredths of a lot.
    ///
    /// Never negative: a non-positive balance sizes to zero, and it is up to
    /// the caller to reject a zero size.
    pub fn size(
        &self,
        balance: f64,
        risk_fraction: f64,
        stop_loss_pips: f64,
        leverage: f64,
    ) -> Result<f64, SizingError> {
        if stop_loss_pips.is_nan() || stop_loss_pips <= 0.0 {
            return Err(SizingError::NonPositiveStop(stop_loss_pips));
        }
        if risk_fraction.is_nan() || risk_fraction <= 0.0 || risk_fraction >= 1.0 {
            return Err(SizingError::RiskFractionOutOfRange(risk_fraction));
        }
        if leverage.is_nan() || leverage < 1.0 {
            return Err(SizingError::LeverageBelowOne(leverage));
        }
        if balance <= 0.0 {
            return Ok(0.0);
        }

        let risk_amount = balance * risk_fraction;
        let lots = risk_amount / (stop_loss_pips * self.pip_value);
        Ok(round_lots(lots * leverage).max(0.0))
    }
}

fn round_lots(lots: f64) -> f64 {
    (lots * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worked_example_sizes_half_a_lot() {
        let sizer = RiskSizer::new(10.0);
        assert_eq!(sizer.size(1000.0, 0.10, 20.0, 1.0).unwrap(), 0.50);
    }

    #[test]
    fn leverage_multiplies_size() {
        let sizer = RiskSizer::new(10.0);
        assert_eq!(sizer.size(1000.0, 0.10, 20.0, 10.0).unwrap(), 5.0);
    }

    #[test]
    fn rounds_to_hundredths() {
        let sizer = RiskSizer::new(10.0);
        // 5000 * 0.02 / (30 * 10) = 0.3333..
        assert_eq!(sizer.size(5000.0, 0.02, 30.0, 1.0).unwrap(), 0.33);
    }

    #[test]
    fn tiny_risk_rounds_to_zero() {
        let sizer = RiskSizer::new(10.0);
        assert_eq!(sizer.size(10.0, 0.01, 50.0, 1.0).unwrap(), 0.0);
    }

    #[test]
    fn non_positive_balance_sizes_to_zero() {
        let sizer = RiskSizer::new(10.0);
        assert_eq!(sizer.size(0.0, 0.02, 20.0, 1.0).unwrap(), 0.0);
        assert_eq!(sizer.size(-250.0, 0.02, 20.0, 1.0).unwrap(), 0.0);
    }

    #[test]
    fn rejects_non_positive_stop() {
        let sizer = RiskSizer::new(10.0);
        assert_eq!(
            sizer.size(1000.0, 0.02, 0.0, 1.0),
            Err(SizingError::NonPositiveStop(0.0))
        );
        assert!(sizer.size(1000.0, 0.02, -5.0, 1.0).is_err());
        assert!(sizer.size(1000.0, 0.02, f64::NAN, 1.0).is_err());
    }

    #[test]
    fn rejects_bad_risk_fraction_and_leverage() {
        let sizer = RiskSizer::new(10.0);
        assert!(matches!(
            sizer.size(1000.0, 0.0, 20.0, 1.0),
            Err(SizingError::RiskFractionOutOfRange(_))
        ));
        assert!(matches!(
            sizer.size(1000.0, 1.5, 20.0, 1.0),
            Err(SizingError::RiskFractionOutOfRange(_))
        ));
        assert!(matches!(
            sizer.size(1000.0, 0.02, 20.0, 0.5),
            Err(SizingError::LeverageBelowOne(_))
        ));
    }

    #[test]
    #[should_panic(expected = "pip_value must be > 0")]
    fn panics_on_zero_pip_value() {
        RiskSizer::new(0.0);
    }
}
