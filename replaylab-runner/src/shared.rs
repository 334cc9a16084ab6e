//! Thread-safe handle to a session.
//!
//! A host with several callers (an interactive front end plus an automation
//! thread) shares one [`Session`] through a [`SharedSession`]. Each method
//! takes the lock once, so a single operation never interleaves with another:
//! ids are allocated under the lock, and a manual close racing a stop-out on
//! the same trade has exactly one winner.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use replaylab_core::domain::{Side, TradeId};
use replaylab_core::ledger::{LedgerError, StopOut, TradeReport};

use crate::session::{RunSummary, Session, StepOutcome};

#[derive(Debug, Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Run `f` with exclusive access. Use for multi-call sequences that must
    /// not interleave with other callers.
    pub fn with<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn step(&self) -> StepOutcome {
        self.lock().step()
    }

    pub fn run(&self, max_steps: Option<usize>) -> RunSummary {
        self.lock().run(max_steps)
    }

    pub fn open_manual(
        &self,
        side: Side,
        stop_loss_pips: f64,
        leverage: f64,
    ) -> Result<TradeId, LedgerError> {
        self.lock().open_manual(side, stop_loss_pips, leverage)
    }

    pub fn close(&self, id: TradeId) -> Result<f64, LedgerError> {
        self.lock().close(id)
    }

    pub fn set_risk_fraction(&self, risk_fraction: f64) -> Result<(), LedgerError> {
        self.lock().set_risk_fraction(risk_fraction)
    }

    pub fn monitor_stop_losses(&self) -> Vec<StopOut> {
        self.lock().monitor_stop_losses()
    }

    pub fn balance(&self) -> f64 {
        self.lock().balance()
    }

    pub fn report(&self) -> TradeReport {
        self.lock().report()
    }

    /// A panic inside one caller leaves the ledger in a consistent state
    /// (every mutation is a single call), so a poisoned lock is recovered.
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<Session> for SharedSession {
    fn from(session: Session) -> Self {
        Self::new(session)
    }
}
