//! Tabular value store: one row per market state, one column per action.

use super::state::{Action, MarketState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QTable {
    values: [[f64; Action::COUNT]; MarketState::COUNT],
}

impl QTable {
    /// All-zero table.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: [[f64; Action::COUNT]; MarketState::COUNT]) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[[f64; Action::COUNT]; MarketState::COUNT] {
        &self.values
    }

    pub fn get(&self, state: MarketState, action: Action) -> f64 {
        self.values[state.index()][action.index()]
    }

    pub fn set(&mut self, state: MarketState, action: Action, value: f64) {
        self.values[state.index()][action.index()] = value;
    }

    pub fn row(&self, state: MarketState) -> &[f64; Action::COUNT] {
        &self.values[state.index()]
    }

    /// Argmax over the row; ties go to the lowest action index.
    pub fn best_action(&self, state: MarketState) -> Action {
        let row = self.row(state);
        let mut best = Action::ALL[0];
        for action in Action::ALL.into_iter().skip(1) {
            if row[action.index()] > row[best.index()] {
                best = action;
            }
        }
        best
    }

    pub fn max_value(&self, state: MarketState) -> f64 {
        self.row(state)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_table_prefers_buy() {
        let q = QTable::new();
        for state in MarketState::ALL {
            assert_eq!(q.best_action(state), Action::Buy);
            assert_eq!(q.max_value(state), 0.0);
        }
    }

    #[test]
    fn ties_break_by_index() {
        let q = QTable::from_values([[0.0, 1.0, 1.0], [2.0, 2.0, 2.0], [-1.0, -1.0, -0.5]]);
        assert_eq!(q.best_action(MarketState::Low), Action::Sell);
        assert_eq!(q.best_action(MarketState::Mid), Action::Buy);
        assert_eq!(q.best_action(MarketState::High), Action::Hold);
        assert_eq!(q.max_value(MarketState::High), -0.5);
    }

    #[test]
    fn serializes_as_nested_rows() {
        let mut q = QTable::new();
        q.set(MarketState::Mid, Action::Hold, 0.25);
        let json = serde_json::to_string(&q).unwrap();
        assert_eq!(json, r#"{"values":[[0.0,0.0,0.0],[0.0,0.0,0.25],[0.0,0.0,0.0]]}"#);
        let back: QTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, q);
    }
}
