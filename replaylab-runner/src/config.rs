//! Serializable simulation configuration.
//!
//! One TOML file describes a replay run: account and cost settings, the
//! instrument, policy learning parameters, the automation switch, and how
//! bars are read. Every section is optional and falls back to its default.
//!
//! ```toml
//! initial_balance = 5000.0
//! risk_fraction = 0.02
//!
//! [instrument]
//! symbol = "AUDCAD"
//! pip_size = 0.0001
//! pip_value = 10.0
//! unit_scale = 10000.0
//!
//! [policy]
//! epsilon = 0.1
//! seed = 42
//!
//! [automation]
//! enabled = true
//! leverage = 10.0
//! stop_loss_pips = 20.0
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use replaylab_core::domain::Instrument;
use replaylab_core::ledger::LedgerConfig;
use replaylab_core::policy::PolicyConfig;

use crate::data_loader::LoadOptions;

/// Unique identifier for a replay run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Policy-driven trading parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// When false the policy never decides; stops are still monitored.
    pub enabled: bool,
    pub leverage: f64,
    pub stop_loss_pips: f64,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            leverage: 10.0,
            stop_loss_pips: 20.0,
        }
    }
}

/// Everything needed to reproduce a replay run, apart from the bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub initial_balance: f64,
    /// Fraction of the balance risked per trade (0.02 = 2%).
    pub risk_fraction: f64,
    pub spread_pips: f64,
    pub commission_per_lot: f64,
    pub instrument: Instrument,
    pub policy: PolicyConfig,
    pub automation: AutomationConfig,
    pub data: LoadOptions,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let ledger = LedgerConfig::default();
        Self {
            initial_balance: ledger.initial_balance,
            risk_fraction: ledger.risk_fraction,
            spread_pips: ledger.spread_pips,
            commission_per_lot: ledger.commission_per_lot,
            instrument: ledger.instrument,
            policy: PolicyConfig::default(),
            automation: AutomationConfig::default(),
            data: LoadOptions::default(),
        }
    }
}

impl SimulationConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values the ledger, sizer or policy cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("initial_balance", self.initial_balance)?;
        let risk = self.risk_fraction;
        if risk.is_nan() || risk <= 0.0 || risk >= 1.0 {
            return Err(invalid("risk_fraction", format!("{risk} is not in (0, 1)")));
        }
        non_negative("spread_pips", self.spread_pips)?;
        non_negative("commission_per_lot", self.commission_per_lot)?;

        positive("instrument.pip_size", self.instrument.pip_size)?;
        positive("instrument.pip_value", self.instrument.pip_value)?;
        positive("instrument.unit_scale", self.instrument.unit_scale)?;

        let policy = &self.policy;
        if policy.low_threshold.is_nan()
            || policy.high_threshold.is_nan()
            || policy.low_threshold > policy.high_threshold
        {
            return Err(invalid(
                "policy.low_threshold",
                format!(
                    "{} must not exceed high_threshold {}",
                    policy.low_threshold, policy.high_threshold
                ),
            ));
        }
        let alpha = policy.learning_rate;
        if alpha.is_nan() || alpha <= 0.0 || alpha > 1.0 {
            return Err(invalid("policy.learning_rate", format!("{alpha} is not in (0, 1]")));
        }
        unit_interval("policy.discount_factor", policy.discount_factor)?;
        unit_interval("policy.epsilon", policy.epsilon)?;

        if self.automation.leverage.is_nan() || self.automation.leverage < 1.0 {
            return Err(invalid(
                "automation.leverage",
                format!("{} is below 1", self.automation.leverage),
            ));
        }
        positive("automation.stop_loss_pips", self.automation.stop_loss_pips)?;

        if self.data.indicator_column.trim().is_empty() {
            return Err(invalid("data.indicator_column", "must not be empty".into()));
        }
        if self.data.rsi_period == Some(0) {
            return Err(invalid("data.rsi_period", "must be at least 1".into()));
        }
        Ok(())
    }

    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            initial_balance: self.initial_balance,
            risk_fraction: self.risk_fraction,
            spread_pips: self.spread_pips,
            commission_per_lot: self.commission_per_lot,
            instrument: self.instrument.clone(),
        }
    }

    /// Deterministic hash of the full configuration.
    ///
    /// Two runs over the same bars with the same RunId produce the same trades.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let canonical = self.to_toml()?;
        Ok(blake3::hash(canonical.as_bytes()).to_hex().to_string())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} is not positive")))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} is negative")))
    }
}

fn unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} is not in [0, 1]")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_all_defaults() {
        let config = SimulationConfig::from_toml("").unwrap();
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.initial_balance, 5000.0);
        assert_eq!(config.risk_fraction, 0.02);
        assert_eq!(config.automation.leverage, 10.0);
        assert_eq!(config.policy.low_threshold, 30.0);
        assert_eq!(config.data.indicator_column, "rsi14");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = SimulationConfig::from_toml(
            r#"
            initial_balance = 1000.0

            [policy]
            epsilon = 0.0
            seed = 9

            [automation]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(config.initial_balance, 1000.0);
        assert_eq!(config.policy.epsilon, 0.0);
        assert_eq!(config.policy.seed, 9);
        assert_eq!(config.policy.learning_rate, 0.1);
        assert!(!config.automation.enabled);
        assert_eq!(config.automation.stop_loss_pips, 20.0);
    }

    #[test]
    fn toml_round_trip() {
        let mut config = SimulationConfig::default();
        config.instrument = Instrument::new("EURUSD", 0.0001, 10.0, 10_000.0);
        config.data.rsi_period = Some(14);
        let text = config.to_toml().unwrap();
        assert_eq!(SimulationConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let cases = [
            ("risk_fraction = 1.5", "risk_fraction"),
            ("initial_balance = 0.0", "initial_balance"),
            ("spread_pips = -1.0", "spread_pips"),
            ("[policy]\nepsilon = 2.0", "policy.epsilon"),
            ("[policy]\nlow_threshold = 80.0", "policy.low_threshold"),
            ("[policy]\nlearning_rate = 0.0", "policy.learning_rate"),
            ("[automation]\nleverage = 0.5", "automation.leverage"),
            ("[automation]\nstop_loss_pips = 0.0", "automation.stop_loss_pips"),
        ];
        for (toml, expected) in cases {
            match SimulationConfig::from_toml(toml) {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected, "{toml}"),
                other => panic!("{toml}: expected Invalid, got {other:?}"),
            }
        }
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(
            SimulationConfig::from_toml("initial_balance = \"lots\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn run_id_deterministic_and_sensitive() {
        let a = SimulationConfig::default();
        let mut b = a.clone();
        assert_eq!(a.run_id().unwrap(), b.run_id().unwrap());
        assert_eq!(a.run_id().unwrap().len(), 64);

        b.policy.seed += 1;
        assert_ne!(a.run_id().unwrap(), b.run_id().unwrap());
    }

    #[test]
    fn ledger_config_carries_account_settings() {
        let config = SimulationConfig::from_toml("commission_per_lot = 3.5").unwrap();
        let ledger = config.ledger_config();
        assert_eq!(ledger.commission_per_lot, 3.5);
        assert_eq!(ledger.initial_balance, 5000.0);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SimulationConfig::from_file(Path::new("/nonexistent/replay.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/replay.toml"));
    }
}
