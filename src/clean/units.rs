use crate::table;
use anyhow::Result;
use arrow::{
    array::StringArray,
    datatypes::{DataType, Field},
    record_batch::RecordBatch,
};
use std::sync::Arc;
use tracing::warn;

/// Map a raw unit string onto the closed STD_UNIT vocabulary.
/// Anything unrecognized collapses to OTHER.
pub fn std_unit(raw: &str) -> &'static str {
    match raw.trim().to_uppercase().as_str() {
        "PCS" | "PIECES" | "NOS" | "NO" | "NUMBERS" => "PCS",
        "KGS" | "KG" | "KILOGRAMS" => "KGS",
        "MTR" | "METER" => "MTR",
        "SETS" | "SET" => "SETS",
        _ => "OTHER",
    }
}

/// Append STD_UNIT derived from the UNIT column. A missing UNIT column is
/// not an error: every row gets OTHER.
pub fn standardize_units(batch: &RecordBatch) -> Result<RecordBatch> {
    let std_units: StringArray = match table::str_column(batch, "UNIT") {
        Some(units) => units
            .iter()
            .map(|opt| Some(opt.map(std_unit).unwrap_or("OTHER")))
            .collect(),
        None => {
            warn!("no UNIT column in source, STD_UNIT defaults to OTHER");
            (0..batch.num_rows()).map(|_| Some("OTHER")).collect()
        }
    };

    table::set_column(
        batch,
        Field::new("STD_UNIT", DataType::Utf8, false),
        Arc::new(std_units),
    )
}
