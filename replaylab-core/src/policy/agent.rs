//! Epsilon-greedy Q-learning agent.

use super::q_table::QTable;
use super::state::{Action, Decision, MarketState};
use super::PolicyConfig;
use crate::domain::Side;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// One applied temporal-difference update, for an observer to log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueUpdate {
    pub state: MarketState,
    pub action: Action,
    pub next_state: MarketState,
    pub reward: f64,
    pub previous: f64,
    pub updated: f64,
}

/// Tabular agent over [`MarketState`] × [`Action`].
///
/// `decide` records the (state, action) pair it considered; `learn` updates
/// that pair from the reward and the newly observed state. The pair is kept
/// until the next `decide` or [`QLearningAgent::reset_episode`].
#[derive(Debug, Clone)]
pub struct QLearningAgent {
    config: PolicyConfig,
    table: QTable,
    rng: StdRng,
    last_pair: Option<(MarketState, Action)>,
}

impl QLearningAgent {
    pub fn new(config: PolicyConfig) -> Self {
        Self::with_table(config, QTable::new())
    }

    /// Start from a previously learned table.
    pub fn with_table(config: PolicyConfig, table: QTable) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            table,
            rng,
            last_pair: None,
        }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn q_table(&self) -> &QTable {
        &self.table
    }

    pub fn last_pair(&self) -> Option<(MarketState, Action)> {
        self.last_pair
    }

    pub fn observe(&self, indicator: f64) -> MarketState {
        MarketState::from_indicator(indicator, &self.config.thresholds())
    }

    /// Epsilon-greedy pick for `state`, without recording it.
    pub fn choose_action(&mut self, state: MarketState) -> Action {
        if self.config.epsilon > 0.0 && self.rng.gen::<f64>() < self.config.epsilon {
            let index = self.rng.gen_range(0..Action::COUNT);
            Action::ALL[index]
        } else {
            self.table.best_action(state)
        }
    }

    /// Pick an action for the observed indicator and map it to a decision.
    ///
    /// The raw pair is always recorded for the next `learn`, even when a held
    /// position turns it into `Hold` or `Close`.
    pub fn decide(&mut self, indicator: f64, position: Option<Side>) -> Decision {
        let state = self.observe(indicator);
        let action = self.choose_action(state);
        self.last_pair = Some((state, action));
        Decision::restrict(action, position)
    }

    /// One-step update of the recorded pair. `None` if nothing was recorded.
    ///
    /// `Q[s,a] += alpha * (reward + gamma * max Q[s',·] - Q[s,a])`
    pub fn learn(&mut self, reward: f64, indicator: f64) -> Option<ValueUpdate> {
        let (state, action) = self.last_pair?;
        let next_state = self.observe(indicator);

        let previous = self.table.get(state, action);
        let target = reward + self.config.discount_factor * self.table.max_value(next_state);
        let updated = previous + self.config.learning_rate * (target - previous);
        self.table.set(state, action, updated);

        Some(ValueUpdate {
            state,
            action,
            next_state,
            reward,
            previous,
            updated,
        })
    }

    /// Forget the recorded pair; the next `learn` before a `decide` is a no-op.
    pub fn reset_episode(&mut self) {
        self.last_pair = None;
    }
}
