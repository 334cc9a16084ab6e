//! Position Sizers — determine trade size in lots
//!
//! Sizers translate an account balance and a risk budget into a lot size.
//! They see the balance and the stop distance, never the direction of the trade.

pub mod risk;

pub use risk::RiskSizer;

use thiserror::Error;

/// Inputs a sizer refuses to work with.
#[derive(Debug, Clone, Copy, Error, PartialEq)]
pub enum SizingError {
    #[error("stop-loss distance must be positive, got {0} pips")]
    NonPositiveStop(f64),

    #[error("risk fraction must be in (0, 1), got {0}")]
    RiskFractionOutOfRange(f64),

    #[error("leverage must be at least 1, got {0}")]
    LeverageBelowOne(f64),
}
