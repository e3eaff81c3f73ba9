pub mod dates;
pub mod units;

pub use units::standardize_units;

use crate::table;
use anyhow::{bail, Context, Result};
use arrow::{
    array::{Date32Builder, Float64Array, Int64Builder, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use chrono::Datelike;
use std::{collections::HashSet, sync::Arc};
use tracing::{debug, warn};

/// Numeric columns that must always carry real numbers after cleaning.
pub const NUMERIC_COLUMNS: &[&str] = &["TOTAL_VALUE_INR", "DUTY_PAID_INR", "QUANTITY"];

/// Normalize a raw header: trim, spaces to underscores, uppercase.
pub fn normalize_name(raw: &str) -> String {
    raw.trim().replace(' ', "_").to_uppercase()
}

/// Rename every column to its normalized header. Two distinct raw headers
/// collapsing onto one normalized name is an error: last-wins would silently
/// drop a column.
pub fn normalize_headers(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut seen = HashSet::new();
    let mut fields = Vec::with_capacity(schema.fields().len());

    for field in schema.fields() {
        let name = normalize_name(field.name());
        if !seen.insert(name.clone()) {
            bail!("header collision after normalization: '{name}'");
        }
        fields.push(Field::new(&name, field.data_type().clone(), field.is_nullable()));
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), batch.columns().to_vec())
        .context("renaming columns")
}

/// Parse the DATE column into Date32 and append derived YEAR and MONTH
/// columns. Unparseable entries become nulls, never errors, and YEAR/MONTH
/// are null exactly where the date is. No DATE column is a no-op.
pub fn parse_dates(batch: &RecordBatch) -> Result<RecordBatch> {
    let Some(idx) = table::column_index(batch, "DATE") else {
        debug!("no DATE column, skipping date parsing");
        return Ok(batch.clone());
    };
    let Some(raw) = batch.column(idx).as_any().downcast_ref::<StringArray>() else {
        // Already typed (e.g. a re-run over cleaned output).
        return Ok(batch.clone());
    };

    let mut date_b = Date32Builder::new();
    let mut year_b = Int64Builder::new();
    let mut month_b = Int64Builder::new();
    let mut failed = 0usize;

    for opt in raw.iter() {
        match opt.and_then(dates::parse_date) {
            Some(date) => {
                date_b.append_value(dates::days_since_epoch(date));
                year_b.append_value(i64::from(date.year()));
                month_b.append_value(i64::from(date.month()));
            }
            None => {
                if opt.is_some() {
                    failed += 1;
                }
                date_b.append_null();
                year_b.append_null();
                month_b.append_null();
            }
        }
    }
    if failed > 0 {
        warn!(failed, "DATE values did not parse and were nulled");
    }

    let batch = table::set_column(
        batch,
        Field::new("DATE", DataType::Date32, true),
        Arc::new(date_b.finish()),
    )?;
    let batch = table::set_column(
        &batch,
        Field::new("YEAR", DataType::Int64, true),
        Arc::new(year_b.finish()),
    )?;
    table::set_column(
        &batch,
        Field::new("MONTH", DataType::Int64, true),
        Arc::new(month_b.finish()),
    )
}

/// Coerce the known numeric columns to Float64. Null or unparseable values
/// become 0.0, a deliberate safe default that overloads zero as both "true
/// zero" and "unparseable". Idempotent: an already-Float64 column is
/// re-emitted with any nulls mapped to 0.
pub fn coerce_numerics(batch: &RecordBatch) -> Result<RecordBatch> {
    let mut out = batch.clone();

    for name in NUMERIC_COLUMNS {
        let Some(idx) = table::column_index(&out, name) else {
            continue;
        };
        let col = out.column(idx);

        let coerced: Float64Array = if let Some(arr) = col.as_any().downcast_ref::<Float64Array>()
        {
            arr.iter().map(|v| Some(v.unwrap_or(0.0))).collect()
        } else if let Some(arr) = col.as_any().downcast_ref::<StringArray>() {
            arr.iter()
                .map(|opt| {
                    // a literal "NaN" parses as a float NaN; it gets the same
                    // safe default as any other unparseable value
                    Some(
                        opt.and_then(|s| s.trim().parse::<f64>().ok())
                            .filter(|v| !v.is_nan())
                            .unwrap_or(0.0),
                    )
                })
                .collect()
        } else {
            bail!(
                "column '{name}' has unsupported type {:?} for numeric coercion",
                col.data_type()
            );
        };

        out = table::set_column(
            &out,
            Field::new(*name, DataType::Float64, false),
            Arc::new(coerced),
        )?;
    }

    Ok(out)
}
