//! Relative Strength Index (RSI).
//!
//! Uses Wilder smoothing of average gains and average losses.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period.
//! Edge cases: avg_loss == 0 → RSI = 100; avg_gain == 0 → RSI = 0;
//! both zero → 50.

use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rsi {
    period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self::new(14)
    }
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self { period }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// RSI per close. The first `period` entries are `None`, as is everything
    /// from the first non-finite close onward.
    pub fn compute(&self, closes: &[f64]) -> Vec<Option<f64>> {
        let n = closes.len();
        let mut result = vec![None; n];
        if n < self.period + 1 {
            return result;
        }

        let change = |i: usize| -> Option<f64> {
            let delta = closes[i] - closes[i - 1];
            delta.is_finite().then_some(delta)
        };

        // Seed over the first `period` changes
        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;
        for i in 1..=self.period {
            let Some(ch) = change(i) else {
                return result;
            };
            if ch > 0.0 {
                avg_gain += ch;
            } else {
                avg_loss -= ch;
            }
        }
        avg_gain /= self.period as f64;
        avg_loss /= self.period as f64;
        result[self.period] = Some(rsi_value(avg_gain, avg_loss));

        let alpha = 1.0 / self.period as f64;
        for (i, slot) in result.iter_mut().enumerate().skip(self.period + 1) {
            let Some(ch) = change(i) else {
                break;
            };
            avg_gain = alpha * ch.max(0.0) + (1.0 - alpha) * avg_gain;
            avg_loss = alpha * (-ch).max(0.0) + (1.0 - alpha) * avg_loss;
            *slot = Some(rsi_value(avg_gain, avg_loss));
        }

        result
    }

    /// Fill `indicator` on bars that have none. Existing values are kept.
    pub fn fill_missing(&self, bars: &mut [Bar]) {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        for (bar, value) in bars.iter_mut().zip(self.compute(&closes)) {
            if bar.indicator.is_none() {
                bar.indicator = value;
            }
        }
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "actual={actual}, expected={expected}"
        );
    }

    #[test]
    fn all_gains_is_100() {
        let result = Rsi::new(3).compute(&[1.0, 1.1, 1.2, 1.3, 1.4, 1.5]);
        assert_approx(result[3].unwrap(), 100.0);
        assert_approx(result[5].unwrap(), 100.0);
    }

    #[test]
    fn all_losses_is_0() {
        let result = Rsi::new(3).compute(&[1.5, 1.4, 1.3, 1.2, 1.1, 1.0]);
        assert_approx(result[3].unwrap(), 0.0);
    }

    #[test]
    fn flat_series_is_50() {
        let result = Rsi::new(3).compute(&[1.0; 5]);
        assert_approx(result[4].unwrap(), 50.0);
    }

    #[test]
    fn mixed_seed_value() {
        // changes: +0.34, -0.25, -0.48 → 100 - 100 / (1 + 0.34 / 0.73)
        let result = Rsi::new(3).compute(&[44.0, 44.34, 44.09, 43.61, 44.33]);
        assert!(result[..3].iter().all(Option::is_none));
        assert_approx(result[3].unwrap(), 100.0 - 100.0 / (1.0 + 0.34 / 0.73));
        let last = result[4].unwrap();
        assert!((0.0..=100.0).contains(&last));
    }

    #[test]
    fn short_series_is_all_none() {
        assert!(Rsi::new(14).compute(&[1.0; 14]).iter().all(Option::is_none));
    }

    #[test]
    fn non_finite_close_stops_output() {
        let result = Rsi::new(2).compute(&[1.0, 1.1, 1.0, f64::NAN, 1.2, 1.3]);
        assert!(result[2].is_some());
        assert!(result[3..].iter().all(Option::is_none));
    }

    #[test]
    fn fill_missing_keeps_existing_values() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let mut bars: Vec<Bar> = [1.0, 1.1, 1.2, 1.3]
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(day.and_hms_opt(0, i as u32, 0).unwrap(), c, c, c, c))
            .collect();
        bars[3].indicator = Some(12.0);

        Rsi::new(2).fill_missing(&mut bars);
        assert_eq!(bars[0].indicator, None);
        assert_approx(bars[2].indicator.unwrap(), 100.0);
        assert_eq!(bars[3].indicator, Some(12.0));
    }
}
