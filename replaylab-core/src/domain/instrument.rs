use serde::{Deserialize, Serialize};

/// Instrument constants used by sizing and profit accounting.
///
/// Defaults describe a standard four-decimal FX pair (AUD/CAD in the sample data):
/// one pip is 0.0001, a standard lot moves 10 account units per pip, and a
/// price delta is scaled to account units by 10 000 per lot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instrument {
    pub symbol: String,
    /// Minimum quoted price increment.
    pub pip_size: f64,
    /// Account value of one pip for one lot.
    pub pip_value: f64,
    /// Multiplier from price delta × lots to account currency.
    pub unit_scale: f64,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, pip_size: f64, pip_value: f64, unit_scale: f64) -> Self {
        Self {
            symbol: symbol.into(),
            pip_size,
            pip_value,
            unit_scale,
        }
    }

    /// Convert a distance in pips to price units.
    pub fn pips_to_price(&self, pips: f64) -> f64 {
        pips * self.pip_size
    }

    /// Convert a price delta to pips.
    pub fn price_to_pips(&self, delta: f64) -> f64 {
        delta / self.pip_size
    }
}

impl Default for Instrument {
    fn default() -> Self {
        Self::new("AUDCAD", 0.0001, 10.0, 10_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pip_conversion_roundtrip() {
        let inst = Instrument::default();
        let price = inst.pips_to_price(20.0);
        assert!((price - 0.0020).abs() < 1e-12);
        assert!((inst.price_to_pips(price) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn custom_instrument_scales() {
        let jpy = Instrument::new("USDJPY", 0.01, 9.1, 100.0);
        assert!((jpy.pips_to_price(15.0) - 0.15).abs() < 1e-12);
    }
}
