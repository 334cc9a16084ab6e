//! Trade — one position from open to close, with its frozen cost parameters.

use super::ids::TradeId;
use super::instrument::Instrument;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// +1 for Buy, -1 for Sell.
    pub fn sign(self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Who asked for the trade. Only reporting treats the two differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeOrigin {
    Manual,
    Policy,
}

/// Why a trade closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    Manual,
    StopLoss,
}

/// Exit fields. Kept as one value so price and time can only appear together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeExit {
    pub price: f64,
    pub time: NaiveDateTime,
    pub reason: ExitReason,
    pub profit: f64,
}

/// A simulated trade.
///
/// Entry fields and cost parameters are frozen at open and reused for every
/// profit computation. The exit is written once by [`Trade::settle`]; a trade
/// is open iff it has no exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // ── Identification ──
    pub id: TradeId,
    pub side: Side,
    pub origin: TradeOrigin,

    // ── Entry ──
    pub entry_price: f64,
    pub size: f64,
    pub open_time: NaiveDateTime,

    // ── Frozen cost parameters ──
    pub stop_loss_pips: f64,
    pub leverage: f64,
    pub spread_pips: f64,
    pub commission_per_lot: f64,

    exit: Option<TradeExit>,
}

/// Parameters that fix a trade's economics at open time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeTerms {
    pub side: Side,
    pub origin: TradeOrigin,
    pub stop_loss_pips: f64,
    pub leverage: f64,
    pub spread_pips: f64,
    pub commission_per_lot: f64,
}

impl Trade {
    pub fn open(
        id: TradeId,
        terms: TradeTerms,
        entry_price: f64,
        size: f64,
        open_time: NaiveDateTime,
    ) -> Self {
        debug_assert!(size > 0.0, "trade size must be positive");
        Self {
            id,
            side: terms.side,
            origin: terms.origin,
            entry_price,
            size,
            open_time,
            stop_loss_pips: terms.stop_loss_pips,
            leverage: terms.leverage,
            spread_pips: terms.spread_pips,
            commission_per_lot: terms.commission_per_lot,
            exit: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.exit.is_none()
    }

    pub fn is_closed(&self) -> bool {
        self.exit.is_some()
    }

    pub fn is_policy_trade(&self) -> bool {
        self.origin == TradeOrigin::Policy
    }

    pub fn exit(&self) -> Option<&TradeExit> {
        self.exit.as_ref()
    }

    pub fn exit_price(&self) -> Option<f64> {
        self.exit.as_ref().map(|e| e.price)
    }

    pub fn close_time(&self) -> Option<NaiveDateTime> {
        self.exit.as_ref().map(|e| e.time)
    }

    /// Realized profit, once closed.
    pub fn profit(&self) -> Option<f64> {
        self.exit.as_ref().map(|e| e.profit)
    }

    pub fn is_winner(&self) -> bool {
        self.profit().is_some_and(|p| p > 0.0)
    }

    /// Stop distance in price units.
    pub fn stop_distance(&self, instrument: &Instrument) -> f64 {
        instrument.pips_to_price(self.stop_loss_pips)
    }

    /// Price at which the stop fires.
    pub fn stop_price(&self, instrument: &Instrument) -> f64 {
        self.entry_price - self.side.sign() * self.stop_distance(instrument)
    }

    /// Whether `price` has reached or passed the stop.
    pub fn stop_crossed(&self, price: f64, instrument: &Instrument) -> bool {
        let trigger = self.stop_price(instrument);
        match self.side {
            Side::Buy => price <= trigger,
            Side::Sell => price >= trigger,
        }
    }

    /// Profit if the trade were closed at `exit_price`.
    ///
    /// ```text
    /// gross = sign × (exit − entry) − spread_pips × pip_size
    /// profit = gross × size × unit_scale × leverage − commission_per_lot × size
    /// ```
    /// Leverage scales the price movement only, never the commission.
    pub fn profit_at(&self, exit_price: f64, instrument: &Instrument) -> f64 {
        let movement = self.side.sign() * (exit_price - self.entry_price)
            - instrument.pips_to_price(self.spread_pips);
        movement * self.size * instrument.unit_scale * self.leverage
            - self.commission_per_lot * self.size
    }

    /// Close the trade. Returns the realized profit, or `None` if the trade
    /// had already been closed (the existing exit is left untouched).
    pub(crate) fn settle(
        &mut self,
        exit_price: f64,
        time: NaiveDateTime,
        reason: ExitReason,
        instrument: &Instrument,
    ) -> Option<f64> {
        if self.exit.is_some() {
            return None;
        }
        let profit = self.profit_at(exit_price, instrument);
        self.exit = Some(TradeExit {
            price: exit_price,
            time,
            reason,
            profit,
        });
        Some(profit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(9, minute, 0)
            .unwrap()
    }

    fn terms(side: Side) -> TradeTerms {
        TradeTerms {
            side,
            origin: TradeOrigin::Manual,
            stop_loss_pips: 20.0,
            leverage: 1.0,
            spread_pips: 2.0,
            commission_per_lot: 7.0,
        }
    }

    #[test]
    fn buy_profit_matches_worked_example() {
        let inst = Instrument::default();
        let trade = Trade::open(TradeId(1), terms(Side::Buy), 1.2000, 0.5, ts(0));
        // (0.0050 - 0.0002) * 0.5 * 10000 - 7 * 0.5 = 24.0 - 3.5
        assert!((trade.profit_at(1.2050, &inst) - 20.5).abs() < 1e-9);
    }

    #[test]
    fn leverage_scales_movement_not_commission() {
        let inst = Instrument::default();
        let mut t = terms(Side::Buy);
        t.leverage = 3.0;
        let trade = Trade::open(TradeId(1), t, 1.2000, 0.5, ts(0));
        assert!((trade.profit_at(1.2050, &inst) - (24.0 * 3.0 - 3.5)).abs() < 1e-9);
    }

    #[test]
    fn sell_profit_flips_movement_sign() {
        let inst = Instrument::default();
        let trade = Trade::open(TradeId(1), terms(Side::Sell), 1.2050, 0.5, ts(0));
        // (0.0050 - 0.0002) * 0.5 * 10000 - 3.5
        assert!((trade.profit_at(1.2000, &inst) - 20.5).abs() < 1e-9);
    }

    #[test]
    fn stop_price_sits_on_the_losing_side() {
        let inst = Instrument::default();
        let buy = Trade::open(TradeId(1), terms(Side::Buy), 1.2000, 0.5, ts(0));
        let sell = Trade::open(TradeId(2), terms(Side::Sell), 1.2000, 0.5, ts(0));
        assert!((buy.stop_price(&inst) - 1.1980).abs() < 1e-12);
        assert!((sell.stop_price(&inst) - 1.2020).abs() < 1e-12);

        assert!(buy.stop_crossed(1.1975, &inst));
        assert!(!buy.stop_crossed(1.1990, &inst));
        assert!(sell.stop_crossed(1.2025, &inst));
        assert!(!sell.stop_crossed(1.2010, &inst));
    }

    #[test]
    fn settle_sets_exit_fields_once() {
        let inst = Instrument::default();
        let mut trade = Trade::open(TradeId(1), terms(Side::Buy), 1.2000, 0.5, ts(0));
        assert!(trade.is_open());
        assert_eq!(trade.exit_price(), None);
        assert_eq!(trade.close_time(), None);

        let profit = trade.settle(1.2050, ts(5), ExitReason::Manual, &inst);
        assert!(profit.is_some());
        assert_eq!(trade.exit_price(), Some(1.2050));
        assert_eq!(trade.close_time(), Some(ts(5)));

        // A second settle is refused and leaves the first exit in place.
        assert_eq!(trade.settle(1.1000, ts(9), ExitReason::StopLoss, &inst), None);
        assert_eq!(trade.exit_price(), Some(1.2050));
        assert_eq!(trade.exit().unwrap().reason, ExitReason::Manual);
    }

    #[test]
    fn trade_serialization_roundtrip() {
        let inst = Instrument::default();
        let mut trade = Trade::open(TradeId(3), terms(Side::Sell), 0.9100, 1.25, ts(0));
        trade.settle(0.9080, ts(12), ExitReason::Manual, &inst);
        let json = serde_json::to_string(&trade).unwrap();
        let deser: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, deser);
    }
}
