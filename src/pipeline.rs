use crate::{clean, enrich, ingest, parse, sink};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Run the whole pipeline: load → clean → parse → engineer → persist.
/// Strictly sequential; each stage consumes the batch the previous one
/// produced. Returns the number of rows written to both sinks.
pub fn run(input: &Path, csv_out: &Path, db_path: &Path, table: &str) -> Result<usize> {
    info!(path = %input.display(), "phase 1: cleaning");
    let batch = ingest::read_batch(input)?;
    let batch = clean::normalize_headers(&batch)?;
    let batch = clean::parse_dates(&batch)?;
    let batch = clean::coerce_numerics(&batch)?;
    let batch = clean::standardize_units(&batch)?;

    info!(rows = batch.num_rows(), "phase 2: parsing descriptions");
    let batch = parse::parse_descriptions(&batch)?;

    info!("phase 3: feature engineering");
    let batch = enrich::landed_cost(&batch)?;
    let batch = enrich::assign_categories(&batch)?;
    let batch = enrich::enrich_supplier(&batch)?;

    info!(path = %csv_out.display(), "phase 4: saving CSV");
    sink::write_csv(&batch, csv_out).context("CSV sink failed")?;

    info!(path = %db_path.display(), table, "phase 5: loading database");
    sink::write_sqlite(&batch, db_path, table).context("database sink failed")?;

    Ok(batch.num_rows())
}
