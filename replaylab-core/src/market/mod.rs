//! Market data as seen by the ledger and the policy.
//!
//! The ledger never owns price history. It asks a [`MarketData`] source for
//! the current reference price and timestamp; the policy asks for the current
//! indicator. [`MarketTape`] is the replay implementation, walking a bar
//! series four sub-steps at a time. [`Quote`] is a fixed snapshot.

pub mod cursor;
pub mod tape;

pub use cursor::Cursor;
pub use tape::MarketTape;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Source of the current reference price.
///
/// All methods return `None` when no market position exists (empty tape,
/// cursor not positioned, indicator still warming up).
pub trait MarketData {
    fn current_price(&self) -> Option<f64>;

    fn current_indicator(&self) -> Option<f64>;

    fn current_time(&self) -> Option<NaiveDateTime>;

    /// Price and time together, or `None` if either is missing.
    fn quote(&self) -> Option<Quote> {
        Some(Quote {
            price: self.current_price()?,
            time: self.current_time()?,
            indicator: self.current_indicator(),
        })
    }
}

/// A point-in-time market snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub price: f64,
    pub time: NaiveDateTime,
    pub indicator: Option<f64>,
}

impl MarketData for Quote {
    fn current_price(&self) -> Option<f64> {
        Some(self.price)
    }

    fn current_indicator(&self) -> Option<f64> {
        self.indicator
    }

    fn current_time(&self) -> Option<NaiveDateTime> {
        Some(self.time)
    }
}

impl<M: MarketData + ?Sized> MarketData for &M {
    fn current_price(&self) -> Option<f64> {
        (**self).current_price()
    }

    fn current_indicator(&self) -> Option<f64> {
        (**self).current_indicator()
    }

    fn current_time(&self) -> Option<NaiveDateTime> {
        (**self).current_time()
    }
}
