//! ReplayLab Core — intrabar path, risk sizing, trade ledger, tabular policy.
//!
//! This crate contains the simulation engine a replay session drives:
//! - Domain types (bars, instruments, trades, ids)
//! - Pure four-point intrabar price path per bar
//! - Market tape and cursor behind the `MarketData` seam
//! - Fixed-fractional risk sizer
//! - Trade ledger with stop-loss monitoring and profit accounting
//! - Epsilon-greedy Q-learning policy and reward model
//!
//! Everything here is synchronous and does no I/O. The ledger records
//! structured events instead of logging.

pub mod domain;
pub mod execution;
pub mod indicators;
pub mod ledger;
pub mod market;
pub mod policy;
pub mod sizers;

pub use domain::{Bar, Instrument, Side, Trade, TradeId, TradeOrigin};
pub use ledger::{LedgerConfig, LedgerError, LedgerEvent, OpenRequest, TradeLedger, TradeReport};
pub use market::{MarketData, MarketTape, Quote};
pub use policy::{Decision, PolicyConfig, QLearningAgent};
