//! MarketTape — a bar series replayed through the intrabar path.

use super::cursor::Cursor;
use super::MarketData;
use crate::domain::Bar;
use crate::execution::{path_price, SubStep};
use chrono::NaiveDateTime;

/// Bars in timestamp order plus a replay cursor.
///
/// The reference price at any moment is [`path_price`] of the current bar at
/// the current sub-step. The indicator and timestamp come from the bar itself
/// and do not change within a bar.
#[derive(Debug, Clone)]
pub struct MarketTape {
    bars: Vec<Bar>,
    cursor: Cursor,
}

impl MarketTape {
    /// Bars are sorted by timestamp; the cursor starts at the first open.
    pub fn new(mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.timestamp);
        Self {
            bars,
            cursor: Cursor::start(),
        }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn current_bar(&self) -> Option<&Bar> {
        self.bars.get(self.cursor.bar)
    }

    /// Move one sub-step forward. Returns false when clamped at the end.
    pub fn advance(&mut self) -> bool {
        self.cursor.advance(self.bars.len())
    }

    /// Move one sub-step back. Returns false when clamped at the start.
    pub fn retreat(&mut self) -> bool {
        if self.bars.is_empty() {
            return false;
        }
        self.cursor.retreat()
    }

    /// Repeat [`MarketTape::advance`] up to `steps` times; returns how many moved.
    pub fn advance_by(&mut self, steps: usize) -> usize {
        (0..steps).take_while(|_| self.advance()).count()
    }

    /// Repeat [`MarketTape::retreat`] up to `steps` times; returns how many moved.
    pub fn retreat_by(&mut self, steps: usize) -> usize {
        (0..steps).take_while(|_| self.retreat()).count()
    }

    /// Jump to the open of `bar_index`, clamped to the last bar.
    pub fn seek(&mut self, bar_index: usize) {
        if self.bars.is_empty() {
            return;
        }
        self.cursor = Cursor {
            bar: bar_index.min(self.bars.len() - 1),
            step: SubStep::OPEN,
        };
    }

    pub fn is_at_end(&self) -> bool {
        self.cursor.is_at_end(self.bars.len())
    }

    /// Up to `size` bars ending at (and including) the current bar.
    pub fn window(&self, size: usize) -> &[Bar] {
        if self.bars.is_empty() {
            return &[];
        }
        let end = self.cursor.bar + 1;
        let start = end.saturating_sub(size);
        &self.bars[start..end]
    }
}

impl MarketData for MarketTape {
    fn current_price(&self) -> Option<f64> {
        self.current_bar().map(|bar| path_price(bar, self.cursor.step))
    }

    fn current_indicator(&self) -> Option<f64> {
        self.current_bar().and_then(|bar| bar.indicator)
    }

    fn current_time(&self) -> Option<NaiveDateTime> {
        self.current_bar().map(|bar| bar.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar_at(day: u32, open: f64, high: f64, low: f64, close: f64) -> Bar {
        let ts = NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Bar::new(ts, open, high, low, close).with_indicator(day as f64 * 10.0)
    }

    fn tape() -> MarketTape {
        MarketTape::new(vec![
            bar_at(3, 1.20, 1.25, 1.10, 1.15),
            bar_at(2, 1.00, 1.30, 0.90, 1.20),
        ])
    }

    #[test]
    fn sorts_bars_by_timestamp() {
        let t = tape();
        assert_eq!(t.bars()[0].open, 1.00);
        assert_eq!(t.bars()[1].open, 1.20);
    }

    #[test]
    fn walks_the_intrabar_path_of_each_bar() {
        let mut t = tape();
        let mut prices = vec![t.current_price().unwrap()];
        while t.advance() {
            prices.push(t.current_price().unwrap());
        }
        assert_eq!(prices, vec![1.00, 1.30, 0.90, 1.20, 1.20, 1.10, 1.25, 1.15]);
        assert!(t.is_at_end());
    }

    #[test]
    fn clamps_at_both_ends() {
        let mut t = tape();
        assert!(!t.retreat());
        assert_eq!(t.advance_by(100), 7);
        assert!(!t.advance());
        assert_eq!(t.current_price(), Some(1.15));
        assert_eq!(t.retreat_by(100), 7);
        assert_eq!(t.current_price(), Some(1.00));
    }

    #[test]
    fn seek_lands_on_bar_open() {
        let mut t = tape();
        t.advance_by(2);
        t.seek(1);
        assert_eq!(t.cursor(), Cursor { bar: 1, step: SubStep::OPEN });
        t.seek(99);
        assert_eq!(t.cursor().bar, 1);
    }

    #[test]
    fn indicator_and_time_follow_the_bar() {
        let mut t = tape();
        assert_eq!(t.current_indicator(), Some(20.0));
        t.advance_by(4);
        assert_eq!(t.current_indicator(), Some(30.0));
        assert_eq!(t.current_time().unwrap().date(), NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
    }

    #[test]
    fn empty_tape_has_no_market_data() {
        let mut t = MarketTape::new(Vec::new());
        assert_eq!(t.current_price(), None);
        assert_eq!(t.quote(), None);
        assert!(!t.advance());
        assert!(!t.retreat());
        assert!(t.window(10).is_empty());
    }

    #[test]
    fn window_ends_at_cursor() {
        let mut t = tape();
        assert_eq!(t.window(5).len(), 1);
        t.seek(1);
        assert_eq!(t.window(5).len(), 2);
        assert_eq!(t.window(1)[0].open, 1.20);
    }
}
