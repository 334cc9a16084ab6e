//! ReplayLab Runner — sessions, configuration, data loading, artifacts.
//!
//! This crate builds on `replaylab-core` to provide:
//! - TOML simulation config with validation and a content-hash run id
//! - CSV bar loading with per-row validation and optional RSI fill
//! - The replay session step loop, logging ledger events through `tracing`
//! - A mutex-guarded shared session for multi-caller hosts
//! - Trade history, Q-table, and report artifacts

pub mod config;
pub mod data_loader;
pub mod export;
pub mod session;
pub mod shared;

pub use config::{AutomationConfig, ConfigError, RunId, SimulationConfig};
pub use data_loader::{load_bars, read_bars, LoadError, LoadOptions};
pub use export::{load_q_table, save_artifacts};
pub use session::{RunSummary, Session, SessionError, StepOutcome, StepReport};
pub use shared::SharedSession;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<SimulationConfig>();
        assert_sync::<SimulationConfig>();
        assert_send::<LoadOptions>();
        assert_sync::<LoadOptions>();
    }

    #[test]
    fn session_is_send() {
        assert_send::<Session>();
    }

    #[test]
    fn shared_session_is_send_sync() {
        assert_send::<SharedSession>();
        assert_sync::<SharedSession>();
    }

    #[test]
    fn step_report_is_send_sync() {
        assert_send::<StepReport>();
        assert_sync::<StepReport>();
    }
}
