//! ReplayLab CLI — replay a bar file through the simulator.
//!
//! Commands:
//! - `run` — load bars from CSV, replay them with the configured policy,
//!   print the report, and save artifacts
//! - `config` — print the default configuration as TOML

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use replaylab_runner::{
    load_bars, load_q_table, save_artifacts, RunSummary, Session, SimulationConfig,
};

#[derive(Parser)]
#[command(
    name = "replaylab",
    about = "ReplayLab CLI — bar replay simulator with a tabular trading policy"
)]
struct Cli {
    /// Write JSON log lines to this file instead of stderr.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a CSV bar file.
    Run {
        /// CSV with date, time, Open, High, Low, Close and an indicator column.
        #[arg(long)]
        data: PathBuf,

        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Stop after this many sub-steps.
        #[arg(long)]
        steps: Option<usize>,

        /// Start from a Q-table saved by an earlier run.
        #[arg(long)]
        q_table: Option<PathBuf>,

        /// Disable the policy; only stops are monitored.
        #[arg(long, default_value_t = false)]
        no_automation: bool,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Print the default configuration as TOML.
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_deref())?;

    match cli.command {
        Commands::Run {
            data,
            config,
            steps,
            q_table,
            no_automation,
            output_dir,
        } => run_replay_cmd(
            &data,
            config.as_deref(),
            steps,
            q_table.as_deref(),
            no_automation,
            &output_dir,
        ),
        Commands::Config => {
            print!("{}", SimulationConfig::default().to_toml()?);
            Ok(())
        }
    }
}

/// Plain stderr logging by default; JSON lines to `log_file` when given.
/// The returned guard flushes the file writer on drop.
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let Some(file_name) = path.file_name() else {
        bail!("--log-file must name a file: {}", path.display());
    };
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log dir: {}", dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter)
        .with_writer(non_blocking)
        .with_current_span(true)
        .with_thread_names(true)
        .init();

    info!(log_file = %path.display(), "logging to file");
    Ok(Some(guard))
}

fn run_replay_cmd(
    data: &Path,
    config_path: Option<&Path>,
    steps: Option<usize>,
    q_table: Option<&Path>,
    no_automation: bool,
    output_dir: &Path,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => SimulationConfig::from_file(path)?,
        None => SimulationConfig::default(),
    };
    if no_automation {
        config.automation.enabled = false;
    }
    info!(run_id = %config.run_id()?, "configuration loaded");

    let bars = load_bars(data, &config.data)
        .with_context(|| format!("failed to load bars from {}", data.display()))?;

    let mut session = Session::new(config, bars)?;
    if let Some(path) = q_table {
        session = session.with_q_table(load_q_table(path)?);
    }

    let summary = session.run(steps);
    print_summary(&session, &summary);

    let run_dir = save_artifacts(&session, output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

fn print_summary(session: &Session, summary: &RunSummary) {
    println!("{}", session.generate_report());
    println!();
    println!("Steps:         {}", summary.steps);
    println!("Exhausted:     {}", summary.exhausted);
    println!("Stop-outs:     {}", summary.stop_outs);
    println!("Value updates: {}", summary.value_updates);
    println!("Equity:        {:.2}", session.equity());
    println!(
        "Open trades:   {}",
        session.ledger().open_trades().count()
    );
}
