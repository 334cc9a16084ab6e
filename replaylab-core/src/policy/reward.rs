//! Reward models: realized profit in, reinforcement signal out.

/// Maps a realized profit to a scalar reward.
pub trait RewardModel: Send + Sync {
    fn reward_for(&self, profit: f64) -> f64;
}

/// Ternary reward: +1 for a gain, -1 for a loss, 0 otherwise.
/// Magnitude is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignReward;

impl RewardModel for SignReward {
    fn reward_for(&self, profit: f64) -> f64 {
        if profit > 0.0 {
            1.0
        } else if profit < 0.0 {
            -1.0
        } else {
            0.0
        }
    }
}

/// [`SignReward`] as a free function.
pub fn reward_for(profit: f64) -> f64 {
    SignReward.reward_for(profit)
}
