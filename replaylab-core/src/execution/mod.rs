//! Execution: where trades get their reference prices.
//!
//! - **Intrabar path**: each bar expands into Open → extreme → extreme → Close,
//!   so stop checks see intrabar excursions without tick data.

pub mod intrabar;

pub use intrabar::{intrabar_path, path_price, SubStep, SUB_STEPS_PER_BAR};
