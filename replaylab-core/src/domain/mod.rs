//! Domain types for ReplayLab

pub mod bar;
pub mod ids;
pub mod instrument;
pub mod trade;

pub use bar::{Bar, BarError};
pub use ids::TradeId;
pub use instrument::Instrument;
pub use trade::{ExitReason, Side, Trade, TradeExit, TradeOrigin, TradeTerms};
