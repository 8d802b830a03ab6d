use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use strike::replay::ReplaySummary;
use strike::{read_log, BellObserver, BellParams};

#[derive(Debug, Parser)]
#[command(name = "strike-replay")]
#[command(about = "Replay a recorded gyro log through the bell observer")]
struct Cli {
    /// Sensor log; only `GYR` lines are used
    #[arg(long)]
    log: PathBuf,

    /// TOML file overriding observer parameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the reported trajectory as CSV
    #[arg(long)]
    out: Option<PathBuf>,

    /// Report interval [s]
    #[arg(long, default_value_t = 0.1)]
    every: f64,
}

#[derive(Debug, Serialize)]
struct Row {
    t: f64,
    angle_deg: f64,
    rate: f64,
    measured_rate: f64,
    torque_constant: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    anyhow::ensure!(
        cli.every.is_finite() && cli.every > 0.0,
        "--every must be > 0"
    );

    let params = match &cli.config {
        Some(path) => BellParams::load(path)
            .with_context(|| format!("failed to load config: {}", path.display()))?,
        None => BellParams::default(),
    };

    let file = File::open(&cli.log)
        .with_context(|| format!("failed to open log: {}", cli.log.display()))?;
    let samples = read_log(BufReader::new(file))
        .with_context(|| format!("failed to parse log: {}", cli.log.display()))?;
    info!(samples = samples.len(), log = %cli.log.display(), "loaded gyro samples");

    let Some(first) = samples.first() else {
        info!("no gyro samples, nothing to do");
        return Ok(());
    };
    let mut observer = BellObserver::new(params, first.t)?;

    let mut summary = ReplaySummary::default();
    let mut rows = Vec::new();
    let mut last_slot = (first.t / cli.every).floor() as i64;
    for &m in &samples {
        summary.record(observer.observe(m));
        let slot = (m.t / cli.every).floor() as i64;
        if slot > last_slot {
            let row = Row {
                t: m.t,
                angle_deg: observer.angle(),
                rate: observer.rate(),
                measured_rate: m.rate,
                torque_constant: observer.torque_constant(),
            };
            println!(
                "{:10.3} {:6.1} {:7.2} {:7.2} {:7.3}",
                row.t, row.angle_deg, row.rate, row.measured_rate, row.torque_constant
            );
            rows.push(row);
        }
        last_slot = slot;
    }

    info!(
        samples = summary.samples,
        resets = summary.resets,
        out_of_order = summary.out_of_order,
        bdc_crossings = summary.bdc_crossings,
        torque_updates = summary.torque_updates,
        final_torque = observer.torque_constant(),
        "replay finished"
    );

    if let Some(path) = &cli.out {
        let mut wtr = csv::Writer::from_path(path)
            .with_context(|| format!("failed to open csv for writing: {}", path.display()))?;
        for row in &rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        info!(path = %path.display(), rows = rows.len(), "wrote trajectory");
    }

    Ok(())
}
