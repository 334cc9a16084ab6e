//! Artifact export — trade history, learned table, and the text report.
//!
//! A run directory holds:
//! - `trades.csv` / `trades.json`: every trade, open ones with empty exit columns
//! - `q_table.json`: the learned value table, reloadable with [`load_q_table`]
//! - `report.txt`: the manual-trade report
//! - `config.toml`: the configuration that produced the run

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use replaylab_core::domain::{ExitReason, Trade, TradeOrigin};
use replaylab_core::policy::QTable;

use crate::session::Session;

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the trade history as CSV.
///
/// Columns: id, origin, side, entry_price, size, leverage, stop_loss_pips,
/// open_time, exit_price, close_time, exit_reason, profit
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "id",
        "origin",
        "side",
        "entry_price",
        "size",
        "leverage",
        "stop_loss_pips",
        "open_time",
        "exit_price",
        "close_time",
        "exit_reason",
        "profit",
    ])?;

    for t in trades {
        let exit = t.exit();
        wtr.write_record([
            t.id.to_string(),
            origin_label(t.origin).to_string(),
            t.side.to_string(),
            format!("{:.5}", t.entry_price),
            format!("{:.2}", t.size),
            format!("{:.1}", t.leverage),
            format!("{:.1}", t.stop_loss_pips),
            t.open_time.to_string(),
            exit.map(|e| format!("{:.5}", e.price)).unwrap_or_default(),
            exit.map(|e| e.time.to_string()).unwrap_or_default(),
            exit.map(|e| reason_label(e.reason).to_string())
                .unwrap_or_default(),
            exit.map(|e| format!("{:.2}", e.profit)).unwrap_or_default(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn origin_label(origin: TradeOrigin) -> &'static str {
    match origin {
        TradeOrigin::Manual => "manual",
        TradeOrigin::Policy => "policy",
    }
}

fn reason_label(reason: ExitReason) -> &'static str {
    match reason {
        ExitReason::Manual => "manual",
        ExitReason::StopLoss => "stop_loss",
    }
}

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_trades_json(trades: &[Trade]) -> Result<String> {
    serde_json::to_string_pretty(trades).context("failed to serialize trades to JSON")
}

pub fn export_q_table(table: &QTable) -> Result<String> {
    serde_json::to_string_pretty(table).context("failed to serialize Q-table to JSON")
}

/// Read a table written by [`save_artifacts`].
pub fn load_q_table(path: &Path) -> Result<QTable> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read Q-table: {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("failed to parse Q-table: {}", path.display()))
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for a session.
///
/// Creates `{symbol}_{run_id prefix}_{timestamp}/` under `output_dir` and
/// returns its path.
pub fn save_artifacts(session: &Session, output_dir: &Path) -> Result<PathBuf> {
    let config = session.config();
    let run_id = config.run_id().context("failed to hash config")?;
    let dirname = format!(
        "{}_{}_{}",
        config.instrument.symbol,
        &run_id[..12],
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let trades = session.ledger().trades();
    write(&run_dir, "trades.csv", &export_trades_csv(trades)?)?;
    write(&run_dir, "trades.json", &export_trades_json(trades)?)?;
    write(&run_dir, "q_table.json", &export_q_table(session.agent().q_table())?)?;
    write(&run_dir, "report.txt", &session.generate_report())?;
    write(
        &run_dir,
        "config.toml",
        &config.to_toml().context("failed to serialize config")?,
    )?;

    Ok(run_dir)
}

fn write(dir: &Path, name: &str, contents: &str) -> Result<()> {
    let path = dir.join(name);
    std::fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))
}
