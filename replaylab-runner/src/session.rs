//! Replay session — wires the tape, ledger, and policy into one step loop.
//!
//! One [`Session::step`] is one tick:
//! 1. advance the cursor one sub-step
//! 2. observe the indicator
//! 3. let the policy decide (when automation is on and the indicator exists)
//! 4. execute the decision, then monitor every open trade's stop
//! 5. turn this tick's realized policy profit into a reward
//!    (profit realized on ticks without an indicator is carried forward)
//! 6. update the value table with that reward and the current indicator
//!
//! Manual operations go through the same ledger between steps. Ledger errors
//! on the automated path are logged and the tick continues.

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use replaylab_core::domain::{Bar, Side, TradeId, TradeOrigin};
use replaylab_core::ledger::{
    LedgerError, LedgerEvent, OpenRequest, StopOut, TradeLedger, TradeReport,
};
use replaylab_core::market::{Cursor, MarketData, MarketTape};
use replaylab_core::policy::{
    Decision, QLearningAgent, QTable, RewardModel, SignReward, ValueUpdate,
};

use crate::config::{AutomationConfig, ConfigError, SimulationConfig};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot replay an empty bar series")]
    NoBars,
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    pub cursor: Cursor,
    pub price: f64,
    pub time: NaiveDateTime,
    pub indicator: Option<f64>,
    /// `None` when automation is off or the indicator is still warming up.
    pub decision: Option<Decision>,
    pub opened: Option<TradeId>,
    /// Policy trade closed by the decision, with its profit.
    pub closed: Option<(TradeId, f64)>,
    pub stop_outs: Vec<StopOut>,
    /// Policy open/close the ledger refused.
    pub rejected: Option<String>,
    pub reward: Option<f64>,
    pub update: Option<ValueUpdate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StepOutcome {
    Advanced(StepReport),
    /// The cursor is clamped at the last close; nothing was done.
    Exhausted,
}

/// Summary returned by [`Session::run`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub steps: usize,
    pub exhausted: bool,
    pub stop_outs: usize,
    pub value_updates: usize,
    pub report: TradeReport,
}

pub struct Session {
    config: SimulationConfig,
    tape: MarketTape,
    ledger: TradeLedger,
    agent: QLearningAgent,
    reward_model: Box<dyn RewardModel>,
    /// Policy profit realized on ticks the policy could not learn from.
    unrewarded: f64,
    steps: usize,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("cursor", &self.tape.cursor())
            .field("bars", &self.tape.len())
            .field("balance", &self.ledger.balance())
            .field("steps", &self.steps)
            .finish()
    }
}

impl Session {
    /// Validate `config` and position the cursor at the first bar's open.
    pub fn new(config: SimulationConfig, bars: Vec<Bar>) -> Result<Self, SessionError> {
        config.validate()?;
        if bars.is_empty() {
            return Err(SessionError::NoBars);
        }
        let ledger = TradeLedger::new(config.ledger_config());
        let agent = QLearningAgent::new(config.policy.clone());
        info!(
            bars = bars.len(),
            symbol = %config.instrument.symbol,
            balance = config.initial_balance,
            automation = config.automation.enabled,
            "session created"
        );
        Ok(Self {
            tape: MarketTape::new(bars),
            ledger,
            agent,
            reward_model: Box::new(SignReward),
            unrewarded: 0.0,
            config,
            steps: 0,
        })
    }

    /// Start the policy from a previously learned table.
    pub fn with_q_table(mut self, table: QTable) -> Self {
        self.agent = QLearningAgent::with_table(self.config.policy.clone(), table);
        self
    }

    /// Replace the default sign-only reward.
    pub fn with_reward_model(mut self, model: Box<dyn RewardModel>) -> Self {
        self.reward_model = model;
        self
    }

    // ── Stepping ───────────────────────────────────────────────────────

    pub fn step(&mut self) -> StepOutcome {
        if !self.tape.advance() {
            return StepOutcome::Exhausted;
        }
        self.steps += 1;

        let Some(quote) = self.tape.quote() else {
            return StepOutcome::Exhausted;
        };
        let mut report = StepReport {
            cursor: self.tape.cursor(),
            price: quote.price,
            time: quote.time,
            indicator: quote.indicator,
            decision: None,
            opened: None,
            closed: None,
            stop_outs: Vec::new(),
            rejected: None,
            reward: None,
            update: None,
        };

        let automation = self.config.automation.clone();
        let indicator = quote.indicator.filter(|_| automation.enabled);

        if let Some(value) = indicator {
            let held = self.policy_position().map(|(_, side)| side);
            let decision = self.agent.decide(value, held);
            report.decision = Some(decision);
            self.execute(decision, &automation, &mut report);
        }

        report.stop_outs = self.ledger.monitor_stop_losses(&self.tape);

        let realized: f64 = report.closed.iter().map(|&(_, p)| p).sum::<f64>()
            + report
                .stop_outs
                .iter()
                .filter(|s| s.origin == TradeOrigin::Policy)
                .map(|s| s.profit)
                .sum::<f64>();

        if let Some(value) = indicator {
            let realized = realized + std::mem::take(&mut self.unrewarded);
            let reward = self.reward_model.reward_for(realized);
            report.reward = Some(reward);
            report.update = self.agent.learn(reward, value);
            if let Some(update) = &report.update {
                debug!(
                    state = %update.state,
                    action = %update.action,
                    next_state = %update.next_state,
                    reward = update.reward,
                    previous = update.previous,
                    updated = update.updated,
                    "value updated"
                );
            }
        } else {
            self.unrewarded += realized;
        }

        self.log_events();
        StepOutcome::Advanced(report)
    }

    /// Step until the tape is exhausted or `max_steps` ticks have run.
    pub fn run(&mut self, max_steps: Option<usize>) -> RunSummary {
        let mut summary = RunSummary {
            steps: 0,
            exhausted: false,
            stop_outs: 0,
            value_updates: 0,
            report: self.ledger.report(),
        };

        while max_steps.map_or(true, |max| summary.steps < max) {
            match self.step() {
                StepOutcome::Advanced(step) => {
                    summary.steps += 1;
                    summary.stop_outs += step.stop_outs.len();
                    summary.value_updates += usize::from(step.update.is_some());
                }
                StepOutcome::Exhausted => {
                    summary.exhausted = true;
                    break;
                }
            }
        }

        summary.report = self.ledger.report();
        info!(
            steps = summary.steps,
            exhausted = summary.exhausted,
            balance = self.ledger.balance(),
            "run finished"
        );
        summary
    }

    fn execute(
        &mut self,
        decision: Decision,
        automation: &AutomationConfig,
        report: &mut StepReport,
    ) {
        match decision {
            Decision::Open(side) => {
                let request =
                    OpenRequest::policy(side, automation.stop_loss_pips, automation.leverage);
                match self.ledger.open(&self.tape, request) {
                    Ok(id) => report.opened = Some(id),
                    Err(e) => {
                        warn!(%side, error = %e, "policy open rejected");
                        report.rejected = Some(e.to_string());
                    }
                }
            }
            Decision::Close => {
                let Some((id, _)) = self.policy_position() else {
                    return;
                };
                match self.ledger.close(&self.tape, id) {
                    Ok(profit) => report.closed = Some((id, profit)),
                    Err(e) => {
                        warn!(trade_id = %id, error = %e, "policy close rejected");
                        report.rejected = Some(e.to_string());
                    }
                }
            }
            Decision::Hold => {}
        }
    }

    // ── Manual operations ──────────────────────────────────────────────

    /// Open a manual trade at the current reference price.
    pub fn open_manual(
        &mut self,
        side: Side,
        stop_loss_pips: f64,
        leverage: f64,
    ) -> Result<TradeId, LedgerError> {
        let result = self
            .ledger
            .open(&self.tape, OpenRequest::manual(side, stop_loss_pips, leverage));
        if let Err(e) = &result {
            warn!(%side, error = %e, "manual open rejected");
        }
        self.log_events();
        result
    }

    /// Close any open trade at the current reference price.
    pub fn close(&mut self, id: TradeId) -> Result<f64, LedgerError> {
        let result = self.ledger.close(&self.tape, id);
        if let Err(e) = &result {
            warn!(trade_id = %id, error = %e, "close rejected");
        }
        self.log_events();
        result
    }

    /// Check stops at the current price without moving the cursor.
    pub fn monitor_stop_losses(&mut self) -> Vec<StopOut> {
        let stopped = self.ledger.monitor_stop_losses(&self.tape);
        self.log_events();
        stopped
    }

    pub fn set_balance(&mut self, balance: f64) {
        self.ledger.set_balance(balance);
        self.log_events();
    }

    /// Fraction of the balance risked by every later open, manual or policy.
    pub fn set_risk_fraction(&mut self, risk_fraction: f64) -> Result<(), LedgerError> {
        let result = self.ledger.set_risk_fraction(risk_fraction);
        match &result {
            Ok(()) => {
                self.config.risk_fraction = risk_fraction;
                info!(risk_fraction, "risk fraction changed");
            }
            Err(e) => warn!(risk_fraction, error = %e, "risk fraction rejected"),
        }
        result
    }

    /// Jump to a bar's open. Trades are not re-evaluated for skipped prices.
    pub fn seek(&mut self, bar: usize) {
        self.tape.seek(bar);
        self.agent.reset_episode();
        self.unrewarded = 0.0;
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn tape(&self) -> &MarketTape {
        &self.tape
    }

    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    pub fn agent(&self) -> &QLearningAgent {
        &self.agent
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn balance(&self) -> f64 {
        self.ledger.balance()
    }

    /// Balance plus mark-to-market of open trades.
    pub fn equity(&self) -> f64 {
        self.ledger.balance() + self.ledger.unrealized_pnl(&self.tape).unwrap_or(0.0)
    }

    pub fn report(&self) -> TradeReport {
        self.ledger.report()
    }

    pub fn generate_report(&self) -> String {
        self.ledger.generate_report()
    }

    /// The open policy trade, if any.
    fn policy_position(&self) -> Option<(TradeId, Side)> {
        self.ledger
            .open_trade_by(TradeOrigin::Policy)
            .map(|t| (t.id, t.side))
    }

    fn log_events(&mut self) {
        for event in self.ledger.drain_events() {
            log_event(&event);
        }
    }
}

fn log_event(event: &LedgerEvent) {
    match event {
        LedgerEvent::TradeOpened {
            id,
            side,
            origin,
            entry_price,
            size,
            leverage,
            time,
        } => info!(
            trade_id = %id,
            %side,
            ?origin,
            entry_price,
            size,
            leverage,
            %time,
            "trade opened"
        ),
        LedgerEvent::TradeClosed {
            id,
            exit_price,
            profit,
            balance,
            time,
        } => info!(
            trade_id = %id,
            exit_price,
            profit,
            balance,
            %time,
            "trade closed"
        ),
        LedgerEvent::StopTriggered {
            id,
            trigger_price,
            observed_price,
            profit,
            balance,
            time,
        } => info!(
            trade_id = %id,
            trigger_price,
            observed_price,
            profit,
            balance,
            %time,
            "stop loss triggered"
        ),
        LedgerEvent::BalanceReset { previous, balance } => {
            info!(previous, balance, "balance reset")
        }
    }
}
