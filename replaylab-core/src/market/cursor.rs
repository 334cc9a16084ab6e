use crate::execution::SubStep;
use serde::{Deserialize, Serialize};

/// Replay position: a bar index plus a sub-step inside that bar.
///
/// Movement is clamped to `[first bar / open, last bar / close]`. Stepping
/// past either end leaves the cursor where it is and reports no movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cursor {
    pub bar: usize,
    pub step: SubStep,
}

impl Cursor {
    pub fn start() -> Self {
        Self {
            bar: 0,
            step: SubStep::OPEN,
        }
    }

    /// Move one sub-step forward over a series of `len` bars.
    /// Returns false when clamped at the last close (or `len == 0`).
    pub fn advance(&mut self, len: usize) -> bool {
        if len == 0 {
            return false;
        }
        match self.step.next() {
            Some(next) => {
                self.step = next;
                true
            }
            None if self.bar + 1 < len => {
                self.bar += 1;
                self.step = SubStep::OPEN;
                true
            }
            None => false,
        }
    }

    /// Move one sub-step back. Returns false when clamped at the first open.
    pub fn retreat(&mut self) -> bool {
        match self.step.prev() {
            Some(prev) => {
                self.step = prev;
                true
            }
            None if self.bar > 0 => {
                self.bar -= 1;
                self.step = SubStep::CLOSE;
                true
            }
            None => false,
        }
    }

    pub fn is_at_start(&self) -> bool {
        self.bar == 0 && self.step.is_open()
    }

    pub fn is_at_end(&self, len: usize) -> bool {
        len == 0 || (self.bar + 1 >= len && self.step.is_close())
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::start()
    }
}
