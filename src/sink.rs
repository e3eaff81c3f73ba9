use crate::clean::dates;
use anyhow::{Context, Result};
use arrow::{
    array::{Array, ArrayRef, Date32Array, Float64Array, Int64Array, StringArray},
    datatypes::DataType,
    record_batch::RecordBatch,
};
use rusqlite::{params_from_iter, types::Value, Connection};
use std::{fs::File, path::Path};
use tracing::{debug, info};

/// Write the batch to a CSV file, header row included. Full overwrite; any
/// previous content at `path` is discarded.
pub fn write_csv(batch: &RecordBatch, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("creating output file {}", path.display()))?;
    let mut writer = arrow::csv::WriterBuilder::new().with_header(true).build(file);
    writer.write(batch).context("writing CSV output")?;
    debug!(rows = batch.num_rows(), path = %path.display(), "CSV written");
    Ok(())
}

/// Replace `table` in the SQLite database at `db_path` with the batch:
/// drop-and-recreate, schema mapped from the Arrow types, all rows inserted
/// in one transaction. No append semantics.
pub fn write_sqlite(batch: &RecordBatch, db_path: &Path, table: &str) -> Result<()> {
    let mut conn = Connection::open(db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;

    conn.execute(&format!("DROP TABLE IF EXISTS \"{table}\""), [])
        .context("dropping previous table")?;

    let schema = batch.schema();
    let columns: Vec<String> = schema
        .fields()
        .iter()
        .map(|f| format!("\"{}\" {}", f.name(), sqlite_type(f.data_type())))
        .collect();
    conn.execute(
        &format!("CREATE TABLE \"{table}\" ({})", columns.join(", ")),
        [],
    )
    .context("creating table")?;

    let tx = conn.transaction().context("starting insert transaction")?;
    {
        let placeholders = vec!["?"; batch.num_columns()].join(", ");
        let mut stmt = tx
            .prepare(&format!("INSERT INTO \"{table}\" VALUES ({placeholders})"))
            .context("preparing insert")?;
        for row in 0..batch.num_rows() {
            let values: Vec<Value> = batch
                .columns()
                .iter()
                .map(|col| cell_value(col, row))
                .collect();
            stmt.execute(params_from_iter(values))
                .with_context(|| format!("inserting row {row}"))?;
        }
    }
    tx.commit().context("committing insert transaction")?;

    info!(rows = batch.num_rows(), table, db = %db_path.display(), "database load complete");
    Ok(())
}

fn sqlite_type(dt: &DataType) -> &'static str {
    match dt {
        DataType::Int64 => "INTEGER",
        DataType::Float64 => "REAL",
        // dates are stored as ISO text, everything else falls back to text
        _ => "TEXT",
    }
}

fn cell_value(col: &ArrayRef, row: usize) -> Value {
    if col.is_null(row) {
        return Value::Null;
    }
    if let Some(arr) = col.as_any().downcast_ref::<StringArray>() {
        Value::Text(arr.value(row).to_string())
    } else if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        Value::Real(arr.value(row))
    } else if let Some(arr) = col.as_any().downcast_ref::<Int64Array>() {
        Value::Integer(arr.value(row))
    } else if let Some(arr) = col.as_any().downcast_ref::<Date32Array>() {
        match dates::date_from_days(arr.value(row)) {
            Some(d) => Value::Text(d.format("%Y-%m-%d").to_string()),
            None => Value::Null,
        }
    } else {
        Value::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clean, ingest::batch_from_csv, table};
    use std::fs;
    use tempfile::tempdir;

    fn cleaned_fixture() -> Result<RecordBatch> {
        let batch = batch_from_csv(
            "DATE,GOODS_DESCRIPTION,TOTAL_VALUE_INR\n2024-03-07,STEEL SPOON,100\n,GLASS JAR,abc\n",
        )?;
        let batch = clean::parse_dates(&batch)?;
        clean::coerce_numerics(&batch)
    }

    #[test]
    fn csv_round_trip_preserves_values() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.csv");
        let batch = cleaned_fixture()?;
        write_csv(&batch, &path)?;

        // re-read with columns treated as already normalized
        let text = fs::read_to_string(&path)?;
        let reread = batch_from_csv(&text)?;
        assert_eq!(reread.num_rows(), batch.num_rows());
        let desc = table::str_column(&reread, "GOODS_DESCRIPTION").unwrap();
        assert_eq!(desc.value(0), "STEEL SPOON");
        let date = table::str_column(&reread, "DATE").unwrap();
        assert_eq!(date.value(0), "2024-03-07");
        assert!(date.is_null(1));
        let total = table::str_column(&reread, "TOTAL_VALUE_INR").unwrap();
        assert_eq!(total.value(1).parse::<f64>()?, 0.0);
        Ok(())
    }

    #[test]
    fn csv_write_is_full_overwrite() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.csv");
        fs::write(&path, "stale content that should vanish\n")?;
        let batch = cleaned_fixture()?;
        write_csv(&batch, &path)?;
        let text = fs::read_to_string(&path)?;
        assert!(!text.contains("stale"));
        Ok(())
    }

    #[test]
    fn sqlite_write_and_count_back() -> Result<()> {
        let dir = tempdir()?;
        let db = dir.path().join("trade.db");
        let batch = cleaned_fixture()?;
        write_sqlite(&batch, &db, "shipments")?;

        let conn = Connection::open(&db)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM shipments", [], |r| r.get(0))?;
        assert_eq!(count, batch.num_rows() as i64);

        let (date, total): (Option<String>, f64) = conn.query_row(
            "SELECT DATE, TOTAL_VALUE_INR FROM shipments LIMIT 1",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        assert_eq!(date.as_deref(), Some("2024-03-07"));
        assert_eq!(total, 100.0);
        Ok(())
    }

    #[test]
    fn sqlite_write_replaces_prior_contents() -> Result<()> {
        let dir = tempdir()?;
        let db = dir.path().join("trade.db");
        let batch = cleaned_fixture()?;
        write_sqlite(&batch, &db, "shipments")?;
        write_sqlite(&batch, &db, "shipments")?;

        let conn = Connection::open(&db)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM shipments", [], |r| r.get(0))?;
        assert_eq!(count, batch.num_rows() as i64, "no append across runs");
        Ok(())
    }
}
