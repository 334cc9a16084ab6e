//! Indicators computed from the bar series.
//!
//! The policy's state input normally arrives precomputed with the data; these
//! fill it in when a source has none.

pub mod rsi;

pub use rsi::Rsi;
