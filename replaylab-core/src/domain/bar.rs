//! Bar — the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLC bar for the replayed instrument, plus the oscillator value the policy
/// discretizes (RSI-14 in the stock data files).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// `None` during the indicator's warmup window.
    pub indicator: Option<f64>,
}

impl Bar {
    pub fn new(timestamp: NaiveDateTime, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            indicator: None,
        }
    }

    pub fn with_indicator(mut self, value: f64) -> Self {
        self.indicator = Some(value);
        self
    }

    /// Close at or above open.
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }

    /// Returns true if any OHLC field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }

    /// Same as [`Bar::is_sane`], but names the first violated rule.
    pub fn validate(&self) -> Result<(), BarError> {
        if self.is_void() {
            return Err(BarError::Void(self.timestamp));
        }
        if self.high < self.low {
            return Err(BarError::HighBelowLow {
                timestamp: self.timestamp,
                high: self.high,
                low: self.low,
            });
        }
        if !self.is_sane() {
            return Err(BarError::OutsideRange(self.timestamp));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum BarError {
    #[error("bar at {0} has NaN prices")]
    Void(NaiveDateTime),

    #[error("bar at {timestamp}: high {high} is below low {low}")]
    HighBelowLow {
        timestamp: NaiveDateTime,
        high: f64,
        low: f64,
    },

    #[error("bar at {0}: open/close outside the high-low range or non-positive")]
    OutsideRange(NaiveDateTime),
}
