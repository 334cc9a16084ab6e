//! Discrete state and action spaces for the tabular policy.

use crate::domain::Side;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Indicator bounds that split the oscillator range into three buckets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateThresholds {
    pub low: f64,
    pub high: f64,
}

impl Default for StateThresholds {
    fn default() -> Self {
        Self {
            low: 30.0,
            high: 70.0,
        }
    }
}

/// Market state as seen by the policy. This is the entire state space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketState {
    Low,
    Mid,
    High,
}

impl MarketState {
    pub const COUNT: usize = 3;
    pub const ALL: [MarketState; Self::COUNT] = [MarketState::Low, MarketState::Mid, MarketState::High];

    /// Low below `thresholds.low`, High above `thresholds.high`, Mid otherwise.
    /// Values on a threshold fall into Mid.
    pub fn from_indicator(value: f64, thresholds: &StateThresholds) -> Self {
        if value < thresholds.low {
            MarketState::Low
        } else if value > thresholds.high {
            MarketState::High
        } else {
            MarketState::Mid
        }
    }

    pub fn index(self) -> usize {
        match self {
            MarketState::Low => 0,
            MarketState::Mid => 1,
            MarketState::High => 2,
        }
    }
}

impl fmt::Display for MarketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketState::Low => write!(f, "low"),
            MarketState::Mid => write!(f, "mid"),
            MarketState::High => write!(f, "high"),
        }
    }
}

/// Raw table action. Index order is the tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Action {
    pub const COUNT: usize = 3;
    pub const ALL: [Action; Self::COUNT] = [Action::Buy, Action::Sell, Action::Hold];

    pub fn index(self) -> usize {
        match self {
            Action::Buy => 0,
            Action::Sell => 1,
            Action::Hold => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Side this action would open, if any.
    pub fn side(self) -> Option<Side> {
        match self {
            Action::Buy => Some(Side::Buy),
            Action::Sell => Some(Side::Sell),
            Action::Hold => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "buy"),
            Action::Sell => write!(f, "sell"),
            Action::Hold => write!(f, "hold"),
        }
    }
}

/// What the caller should do after [`super::QLearningAgent::decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Open a new position. Only returned when flat.
    Open(Side),
    Hold,
    /// Close the held position.
    Close,
}

impl Decision {
    /// Apply the held-position restriction to a raw action.
    ///
    /// Flat: Buy/Sell open, Hold holds. Holding: the action opposite to the
    /// held side closes, everything else holds.
    pub fn restrict(action: Action, position: Option<Side>) -> Self {
        match (position, action.side()) {
            (None, Some(side)) => Decision::Open(side),
            (None, None) => Decision::Hold,
            (Some(held), Some(side)) if side == held.opposite() => Decision::Close,
            (Some(_), _) => Decision::Hold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_follow_thresholds() {
        let t = StateThresholds::default();
        assert_eq!(MarketState::from_indicator(25.0, &t), MarketState::Low);
        assert_eq!(MarketState::from_indicator(50.0, &t), MarketState::Mid);
        assert_eq!(MarketState::from_indicator(75.0, &t), MarketState::High);
    }

    #[test]
    fn threshold_values_are_mid() {
        let t = StateThresholds::default();
        assert_eq!(MarketState::from_indicator(30.0, &t), MarketState::Mid);
        assert_eq!(MarketState::from_indicator(70.0, &t), MarketState::Mid);
    }

    #[test]
    fn indices_are_dense() {
        for (i, s) in MarketState::ALL.iter().enumerate() {
            assert_eq!(s.index(), i);
        }
        for (i, a) in Action::ALL.iter().enumerate() {
            assert_eq!(a.index(), i);
            assert_eq!(Action::from_index(i), Some(*a));
        }
        assert_eq!(Action::from_index(3), None);
    }

    #[test]
    fn flat_restriction_passes_through() {
        assert_eq!(Decision::restrict(Action::Buy, None), Decision::Open(Side::Buy));
        assert_eq!(Decision::restrict(Action::Sell, None), Decision::Open(Side::Sell));
        assert_eq!(Decision::restrict(Action::Hold, None), Decision::Hold);
    }

    #[test]
    fn held_position_never_opens() {
        for held in [Side::Buy, Side::Sell] {
            for action in Action::ALL {
                let d = Decision::restrict(action, Some(held));
                assert!(!matches!(d, Decision::Open(_)));
            }
        }
        assert_eq!(Decision::restrict(Action::Sell, Some(Side::Buy)), Decision::Close);
        assert_eq!(Decision::restrict(Action::Buy, Some(Side::Buy)), Decision::Hold);
        assert_eq!(Decision::restrict(Action::Buy, Some(Side::Sell)), Decision::Close);
    }
}
