//! Structured ledger events.
//!
//! The ledger records what happened; whoever drains the buffer decides how
//! (or whether) to log it.

use crate::domain::{Side, TradeId, TradeOrigin};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    TradeOpened {
        id: TradeId,
        side: Side,
        origin: TradeOrigin,
        entry_price: f64,
        size: f64,
        leverage: f64,
        time: NaiveDateTime,
    },
    TradeClosed {
        id: TradeId,
        exit_price: f64,
        profit: f64,
        balance: f64,
        time: NaiveDateTime,
    },
    StopTriggered {
        id: TradeId,
        /// Price the trade was closed at.
        trigger_price: f64,
        /// Reference price that crossed the trigger; may be past it after a gap.
        observed_price: f64,
        profit: f64,
        balance: f64,
        time: NaiveDateTime,
    },
    BalanceReset {
        previous: f64,
        balance: f64,
    },
}

impl LedgerEvent {
    /// Trade the event is about, if any.
    pub fn trade_id(&self) -> Option<TradeId> {
        match self {
            LedgerEvent::TradeOpened { id, .. }
            | LedgerEvent::TradeClosed { id, .. }
            | LedgerEvent::StopTriggered { id, .. } => Some(*id),
            LedgerEvent::BalanceReset { .. } => None,
        }
    }
}
