use anyhow::Result;
use std::{env, path::Path, path::PathBuf, process};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};
use tradeflow::{ingest, pipeline};

/// Default input filename probed under the candidate locations when no
/// explicit path is given on the command line.
const DEFAULT_INPUT: &str = "shipments.csv";
const OUTPUT_CSV: &str = "processed_trade_data.csv";
const DB_PATH: &str = "trade_analysis.db";
const TABLE_NAME: &str = "shipments";

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("=== starting pipeline ===");

    // ─── 2) find the raw file ────────────────────────────────────────
    let explicit = env::args().nth(1).map(PathBuf::from);
    let input = match ingest::locate_input(explicit.as_deref(), DEFAULT_INPUT) {
        Ok(path) => path,
        Err(err) => {
            // clean no-op failure: report and terminate without output
            error!("{err:#}");
            process::exit(1);
        }
    };
    info!(path = %input.display(), "input data found");

    // ─── 3) run all stages and persist ───────────────────────────────
    let rows = pipeline::run(&input, Path::new(OUTPUT_CSV), Path::new(DB_PATH), TABLE_NAME)?;

    info!(rows, csv = OUTPUT_CSV, db = DB_PATH, "=== pipeline finished ===");
    Ok(())
}
