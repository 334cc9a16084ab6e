//! Performance summary over closed manual trades.

use crate::domain::Trade;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate statistics for the human-facing report.
///
/// Built from closed, manually-opened trades only; policy trades are kept out
/// so manual and automated performance are never mixed. A break-even trade
/// counts as a loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeReport {
    pub balance: f64,
    pub total_profit: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
}

impl TradeReport {
    /// Summarize `trades`, skipping any that are still open or policy-originated.
    pub fn from_trades<'a>(trades: impl IntoIterator<Item = &'a Trade>, balance: f64) -> Self {
        let mut total_profit = 0.0;
        let mut total_trades = 0;
        let mut winning_trades = 0;

        for trade in trades {
            if trade.is_policy_trade() {
                continue;
            }
            let Some(profit) = trade.profit() else {
                continue;
            };
            total_profit += profit;
            total_trades += 1;
            if profit > 0.0 {
                winning_trades += 1;
            }
        }

        Self {
            balance,
            total_profit,
            total_trades,
            winning_trades,
            losing_trades: total_trades - winning_trades,
        }
    }

    /// Win rate in percent, 0 with no trades.
    pub fn win_rate(&self) -> f64 {
        if self.total_trades == 0 {
            return 0.0;
        }
        self.winning_trades as f64 / self.total_trades as f64 * 100.0
    }
}

impl fmt::Display for TradeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Trading Report:")?;
        writeln!(f, "Account Balance: {:.2}", self.balance)?;
        writeln!(f, "Total Profit: {:.2}", self.total_profit)?;
        writeln!(f, "Total Trades: {}", self.total_trades)?;
        writeln!(f, "Winning Trades: {}", self.winning_trades)?;
        writeln!(f, "Losing Trades: {}", self.losing_trades)?;
        write!(f, "Win Rate: {:.2}%", self.win_rate())
    }
}
