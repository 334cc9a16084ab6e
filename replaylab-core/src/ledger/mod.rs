//! Trade ledger — the trade lifecycle state machine and the account balance.
//!
//! The ledger owns every trade ever opened (closed trades stay for reporting)
//! and the account balance. It manages:
//! - Opening trades sized by [`RiskSizer`] at the current reference price
//! - Manual closes at the current reference price
//! - Stop-loss monitoring, closing at the trigger price
//! - Profit accounting into the balance
//! - A buffer of [`LedgerEvent`]s for an outside observer
//!
//! A trade moves Open → Closed exactly once. The balance only changes when a
//! trade closes (or on an explicit [`TradeLedger::set_balance`]), so at all
//! times `balance == baseline + Σ profit(closed trades)`.
//!
//! The ledger reads prices through [`MarketData`] and never stores them.

pub mod event;
pub mod report;

pub use event::LedgerEvent;
pub use report::TradeReport;

use crate::domain::{ExitReason, Instrument, Side, Trade, TradeId, TradeOrigin, TradeTerms};
use crate::market::MarketData;
use crate::sizers::{RiskSizer, SizingError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from ledger operations. All are recoverable at the call site.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LedgerError {
    #[error("no market data at the current cursor position")]
    NoMarketData,

    #[error("computed trade size {size} is not positive")]
    UnsizableTrade { size: f64 },

    #[error("no open trade with id {0}")]
    TradeNotFound(TradeId),

    #[error("invalid risk parameters: {0}")]
    InvalidRiskParameters(#[from] SizingError),
}

/// Account and cost settings applied to every trade the ledger opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub initial_balance: f64,
    /// Fraction of the balance risked per trade (0.02 = 2%).
    pub risk_fraction: f64,
    pub spread_pips: f64,
    pub commission_per_lot: f64,
    pub instrument: Instrument,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            initial_balance: 5000.0,
            risk_fraction: 0.02,
            spread_pips: 2.0,
            commission_per_lot: 7.0,
            instrument: Instrument::default(),
        }
    }
}

/// What the caller wants opened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenRequest {
    pub side: Side,
    pub stop_loss_pips: f64,
    pub leverage: f64,
    pub origin: TradeOrigin,
}

impl OpenRequest {
    pub fn manual(side: Side, stop_loss_pips: f64, leverage: f64) -> Self {
        Self {
            side,
            stop_loss_pips,
            leverage,
            origin: TradeOrigin::Manual,
        }
    }

    pub fn policy(side: Side, stop_loss_pips: f64, leverage: f64) -> Self {
        Self {
            side,
            stop_loss_pips,
            leverage,
            origin: TradeOrigin::Policy,
        }
    }
}

/// A trade closed by [`TradeLedger::monitor_stop_losses`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopOut {
    pub id: TradeId,
    pub origin: TradeOrigin,
    pub trigger_price: f64,
    pub observed_price: f64,
    pub profit: f64,
}

/// Trades plus balance.
#[derive(Debug, Clone)]
pub struct TradeLedger {
    config: LedgerConfig,
    sizer: RiskSizer,
    /// Insertion order == id order.
    trades: Vec<Trade>,
    balance: f64,
    baseline: f64,
    last_id: TradeId,
    events: Vec<LedgerEvent>,
}

impl TradeLedger {
    pub fn new(config: LedgerConfig) -> Self {
        let sizer = RiskSizer::new(config.instrument.pip_value);
        Self {
            balance: config.initial_balance,
            baseline: config.initial_balance,
            config,
            sizer,
            trades: Vec::new(),
            last_id: TradeId(0),
            events: Vec::new(),
        }
    }

    // ── Lifecycle ──────────────────────────────────────────────────────

    /// Open a trade at the current reference price.
    ///
    /// Fails with `NoMarketData` without a price, `InvalidRiskParameters` for
    /// a non-positive stop / out-of-range risk / leverage below 1, and
    /// `UnsizableTrade` if the size rounds to zero. Nothing is recorded on
    /// failure. The balance is not touched.
    pub fn open<M: MarketData + ?Sized>(
        &mut self,
        market: &M,
        request: OpenRequest,
    ) -> Result<TradeId, LedgerError> {
        let quote = market.quote().ok_or(LedgerError::NoMarketData)?;
        let size = self.sizer.size(
            self.balance,
            self.config.risk_fraction,
            request.stop_loss_pips,
            request.leverage,
        )?;
        if size <= 0.0 {
            return Err(LedgerError::UnsizableTrade { size });
        }

        let id = self.last_id.next();
        let terms = TradeTerms {
            side: request.side,
            origin: request.origin,
            stop_loss_pips: request.stop_loss_pips,
            leverage: request.leverage,
            spread_pips: self.config.spread_pips,
            commission_per_lot: self.config.commission_per_lot,
        };
        self.trades
            .push(Trade::open(id, terms, quote.price, size, quote.time));
        self.last_id = id;

        self.events.push(LedgerEvent::TradeOpened {
            id,
            side: request.side,
            origin: request.origin,
            entry_price: quote.price,
            size,
            leverage: request.leverage,
            time: quote.time,
        });
        Ok(id)
    }

    /// Close an open trade at the current reference price; returns the profit.
    ///
    /// A second close of the same id fails with `TradeNotFound`.
    pub fn close<M: MarketData + ?Sized>(
        &mut self,
        market: &M,
        id: TradeId,
    ) -> Result<f64, LedgerError> {
        let index = self
            .open_index(id)
            .ok_or(LedgerError::TradeNotFound(id))?;
        let quote = market.quote().ok_or(LedgerError::NoMarketData)?;

        let profit = self.trades[index]
            .settle(quote.price, quote.time, ExitReason::Manual, &self.config.instrument)
            .ok_or(LedgerError::TradeNotFound(id))?;
        self.balance += profit;

        self.events.push(LedgerEvent::TradeClosed {
            id,
            exit_price: quote.price,
            profit,
            balance: self.balance,
            time: quote.time,
        });
        Ok(profit)
    }

    /// Close every open trade whose stop the current price has reached.
    ///
    /// Buy stops fire at `price <= entry - stop`, sell stops at
    /// `price >= entry + stop`. The exit is booked at the trigger price, not at
    /// the observed price, so a gap through the stop is not charged twice.
    /// Already-closed trades are skipped; without a price nothing happens.
    pub fn monitor_stop_losses<M: MarketData + ?Sized>(&mut self, market: &M) -> Vec<StopOut> {
        let Some(quote) = market.quote() else {
            return Vec::new();
        };
        let instrument = &self.config.instrument;
        let mut stopped = Vec::new();

        for trade in self.trades.iter_mut().filter(|t| t.is_open()) {
            if !trade.stop_crossed(quote.price, instrument) {
                continue;
            }
            let trigger_price = trade.stop_price(instrument);
            let Some(profit) =
                trade.settle(trigger_price, quote.time, ExitReason::StopLoss, instrument)
            else {
                continue;
            };
            self.balance += profit;

            self.events.push(LedgerEvent::StopTriggered {
                id: trade.id,
                trigger_price,
                observed_price: quote.price,
                profit,
                balance: self.balance,
                time: quote.time,
            });
            stopped.push(StopOut {
                id: trade.id,
                origin: trade.origin,
                trigger_price,
                observed_price: quote.price,
                profit,
            });
        }

        stopped
    }

    /// Explicit balance reset. Re-bases the baseline so the balance identity
    /// keeps holding over the existing closed trades.
    pub fn set_balance(&mut self, balance: f64) {
        let previous = self.balance;
        self.baseline = balance - self.realized_pnl();
        self.balance = balance;
        self.events.push(LedgerEvent::BalanceReset { previous, balance });
    }

    /// Change the fraction of the balance risked by future trades. Open
    /// trades keep the size they were opened with.
    pub fn set_risk_fraction(&mut self, risk_fraction: f64) -> Result<(), LedgerError> {
        if risk_fraction.is_nan() || risk_fraction <= 0.0 || risk_fraction >= 1.0 {
            return Err(SizingError::RiskFractionOutOfRange(risk_fraction).into());
        }
        self.config.risk_fraction = risk_fraction;
        Ok(())
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Balance the realized profits are counted from.
    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn instrument(&self) -> &Instrument {
        &self.config.instrument
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn trade(&self, id: TradeId) -> Option<&Trade> {
        self.index_of(id).map(|i| &self.trades[i])
    }

    pub fn open_trades(&self) -> impl Iterator<Item = &Trade> + '_ {
        self.trades.iter().filter(|t| t.is_open())
    }

    pub fn closed_trades(&self) -> impl Iterator<Item = &Trade> + '_ {
        self.trades.iter().filter(|t| t.is_closed())
    }

    /// First open trade with the given origin.
    pub fn open_trade_by(&self, origin: TradeOrigin) -> Option<&Trade> {
        self.open_trades().find(|t| t.origin == origin)
    }

    /// Sum of profit over closed trades.
    pub fn realized_pnl(&self) -> f64 {
        self.closed_trades().filter_map(Trade::profit).sum()
    }

    /// Mark-to-market profit of open trades at the current price.
    pub fn unrealized_pnl<M: MarketData + ?Sized>(&self, market: &M) -> Option<f64> {
        let price = market.current_price()?;
        Some(
            self.open_trades()
                .map(|t| t.profit_at(price, &self.config.instrument))
                .sum(),
        )
    }

    /// Summary of closed manual trades.
    pub fn report(&self) -> TradeReport {
        TradeReport::from_trades(&self.trades, self.balance)
    }

    /// Text rendering of [`TradeLedger::report`].
    pub fn generate_report(&self) -> String {
        self.report().to_string()
    }

    /// Take all events recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn index_of(&self, id: TradeId) -> Option<usize> {
        self.trades.binary_search_by_key(&id, |t| t.id).ok()
    }

    fn open_index(&self, id: TradeId) -> Option<usize> {
        self.index_of(id).filter(|&i| self.trades[i].is_open())
    }
}

impl Default for TradeLedger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}
