use serde::{Deserialize, Serialize};
use std::fmt;

/// Trade ID, unique within one ledger.
///
/// Assigned from a counter that only moves forward, so ids are never reused
/// even after the trade they named has closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TradeId(pub u64);

impl TradeId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl From<u64> for TradeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
