//! Tabular reinforcement-learning policy.
//!
//! A single bounded indicator is bucketed into [`MarketState`]; the agent keeps
//! a 3×3 [`QTable`] over (state, [`Action`]) and selects epsilon-greedily.
//! Rewards come from a [`RewardModel`] applied to realized profit.

pub mod agent;
pub mod q_table;
pub mod reward;
pub mod state;

pub use agent::{QLearningAgent, ValueUpdate};
pub use q_table::QTable;
pub use reward::{reward_for, RewardModel, SignReward};
pub use state::{Action, Decision, MarketState, StateThresholds};

use serde::{Deserialize, Serialize};

/// Learning parameters and state bucket bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub low_threshold: f64,
    pub high_threshold: f64,
    /// Alpha.
    pub learning_rate: f64,
    /// Gamma.
    pub discount_factor: f64,
    /// Exploration probability.
    pub epsilon: f64,
    pub seed: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            low_threshold: 30.0,
            high_threshold: 70.0,
            learning_rate: 0.1,
            discount_factor: 0.9,
            epsilon: 0.1,
            seed: 42,
        }
    }
}

impl PolicyConfig {
    pub fn thresholds(&self) -> StateThresholds {
        StateThresholds {
            low: self.low_threshold,
            high: self.high_threshold,
        }
    }
}
