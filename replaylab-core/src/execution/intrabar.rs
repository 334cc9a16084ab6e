//! Intrabar price path: a deterministic 4-point walk through one bar.
//!
//! Bars carry no tick data, so stop checks would otherwise only ever see the
//! close. Each bar is expanded into four reference prices:
//!
//! ```text
//! sub-step 0: Open
//! sub-step 1: first extreme   (High if bullish, Low if bearish)
//! sub-step 2: second extreme  (Low if bullish, High if bearish)
//! sub-step 3: Close
//! ```
//!
//! A bullish bar (close >= open) is assumed to have dipped late, so the high
//! comes first; a bearish bar visits its low first.

use crate::domain::Bar;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of reference prices generated per bar.
pub const SUB_STEPS_PER_BAR: u8 = 4;

/// Position inside a bar's intrabar path, always in `0..=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubStep(u8);

impl SubStep {
    pub const OPEN: SubStep = SubStep(0);
    pub const FIRST_EXTREME: SubStep = SubStep(1);
    pub const SECOND_EXTREME: SubStep = SubStep(2);
    pub const CLOSE: SubStep = SubStep(3);

    /// Returns `None` for indices past the close.
    pub fn new(index: u8) -> Option<Self> {
        (index < SUB_STEPS_PER_BAR).then_some(SubStep(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn is_open(self) -> bool {
        self == Self::OPEN
    }

    pub fn is_close(self) -> bool {
        self == Self::CLOSE
    }

    /// Next sub-step within the same bar, `None` after the close.
    pub fn next(self) -> Option<Self> {
        Self::new(self.0 + 1)
    }

    /// Previous sub-step within the same bar, `None` before the open.
    pub fn prev(self) -> Option<Self> {
        self.0.checked_sub(1).map(SubStep)
    }

    pub fn all() -> [SubStep; 4] {
        [Self::OPEN, Self::FIRST_EXTREME, Self::SECOND_EXTREME, Self::CLOSE]
    }
}

impl fmt::Display for SubStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference price of `bar` at `step`.
pub fn path_price(bar: &Bar, step: SubStep) -> f64 {
    match step.index() {
        0 => bar.open,
        1 => {
            if bar.is_bullish() {
                bar.high
            } else {
                bar.low
            }
        }
        2 => {
            if bar.is_bullish() {
                bar.low
            } else {
                bar.high
            }
        }
        _ => bar.close,
    }
}

/// The whole 4-point path of `bar`, in visiting order.
pub fn intrabar_path(bar: &Bar) -> [f64; 4] {
    SubStep::all().map(|step| path_price(bar, step))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(open: f64, high: f64, low: f64, close: f64) -> Bar {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Bar::new(ts, open, high, low, close)
    }

    #[test]
    fn bullish_bar_visits_high_first() {
        let b = bar(1.0, 1.5, 0.8, 1.2);
        assert_eq!(intrabar_path(&b), [1.0, 1.5, 0.8, 1.2]);
    }

    #[test]
    fn bearish_bar_visits_low_first() {
        let b = bar(1.2, 1.5, 0.8, 1.0);
        assert_eq!(intrabar_path(&b), [1.2, 0.8, 1.5, 1.0]);
    }

    #[test]
    fn doji_counts_as_bullish() {
        let b = bar(1.0, 1.1, 0.9, 1.0);
        assert_eq!(path_price(&b, SubStep::FIRST_EXTREME), 1.1);
        assert_eq!(path_price(&b, SubStep::SECOND_EXTREME), 0.9);
    }

    #[test]
    fn sub_step_bounds() {
        assert!(SubStep::new(3).is_some());
        assert!(SubStep::new(4).is_none());
        assert_eq!(SubStep::CLOSE.next(), None);
        assert_eq!(SubStep::OPEN.prev(), None);
        assert_eq!(SubStep::OPEN.next(), Some(SubStep::FIRST_EXTREME));
        assert_eq!(SubStep::CLOSE.prev(), Some(SubStep::SECOND_EXTREME));
    }
}
