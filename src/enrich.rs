use crate::{clean, table};
use anyhow::Result;
use arrow::{
    array::{Array, Float64Array, StringArray},
    datatypes::{DataType, Field},
    record_batch::RecordBatch,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Category keyword sets in priority order, first match wins.
const CATEGORY_RULES: &[(&[&str], &str)] = &[
    (&["CUTLERY", "SPOON", "FORK"], "KITCHENWARE"),
    (&["SCRUBBER", "CLEANING"], "CLEANING"),
    (&["GLASS"], "GLASSWARE"),
];

/// Sub-categories only apply within GLASSWARE; everything else is STANDARD.
const GLASSWARE_SUB_RULES: &[(&str, &str)] = &[("BOROSILICATE", "BOROSILICATE"), ("OPAL", "OPALWARE")];

const SUPPLIER_GROUPS: u64 = 5;

/// Append GRAND_TOTAL_INR and LANDED_COST_PER_UNIT. The numeric columns are
/// re-coerced first (idempotent with the clean stage) so this operation is
/// total even on a raw table. Division by a zero quantity yields 0, not an
/// error.
pub fn landed_cost(batch: &RecordBatch) -> Result<RecordBatch> {
    let batch = clean::coerce_numerics(batch)?;
    let n = batch.num_rows();

    let total = f64_values(&batch, "TOTAL_VALUE_INR", n);
    let duty = f64_values(&batch, "DUTY_PAID_INR", n);
    let qty = f64_values(&batch, "QUANTITY", n);

    let mut grand = Vec::with_capacity(n);
    let mut landed = Vec::with_capacity(n);
    for i in 0..n {
        let g = total[i] + duty[i];
        grand.push(Some(g));
        landed.push(Some(if qty[i] > 0.0 { g / qty[i] } else { 0.0 }));
    }

    let grand: Float64Array = grand.into_iter().collect();
    let landed: Float64Array = landed.into_iter().collect();

    let batch = table::set_column(
        &batch,
        Field::new("GRAND_TOTAL_INR", DataType::Float64, false),
        Arc::new(grand),
    )?;
    table::set_column(
        &batch,
        Field::new("LANDED_COST_PER_UNIT", DataType::Float64, false),
        Arc::new(landed),
    )
}

/// Materialize a numeric column as plain values; a column missing from the
/// table contributes zeros.
fn f64_values(batch: &RecordBatch, name: &str, n: usize) -> Vec<f64> {
    match table::f64_column(batch, name) {
        Some(arr) => arr.iter().map(|v| v.unwrap_or(0.0)).collect(),
        None => vec![0.0; n],
    }
}

fn categorize(text: &str) -> (&'static str, &'static str) {
    let category = CATEGORY_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| text.contains(k)))
        .map(|(_, label)| *label)
        .unwrap_or("GENERAL");

    let sub_category = if category == "GLASSWARE" {
        GLASSWARE_SUB_RULES
            .iter()
            .find(|(keyword, _)| text.contains(keyword))
            .map(|(_, label)| *label)
            .unwrap_or("STANDARD")
    } else {
        "STANDARD"
    };

    (category, sub_category)
}

/// Append CATEGORY and SUB_CATEGORY from the description keywords. Rows with
/// no description fall through to GENERAL / STANDARD.
pub fn assign_categories(batch: &RecordBatch) -> Result<RecordBatch> {
    let n = batch.num_rows();
    let descs = table::str_column(batch, "GOODS_DESCRIPTION");

    let mut categories = Vec::with_capacity(n);
    let mut subs = Vec::with_capacity(n);
    for i in 0..n {
        let (cat, sub) = match descs {
            Some(arr) if !arr.is_null(i) => categorize(&arr.value(i).to_uppercase()),
            _ => ("GENERAL", "STANDARD"),
        };
        categories.push(Some(cat));
        subs.push(Some(sub));
    }

    let categories: StringArray = categories.into_iter().collect();
    let subs: StringArray = subs.into_iter().collect();

    let batch = table::set_column(
        batch,
        Field::new("CATEGORY", DataType::Utf8, false),
        Arc::new(categories),
    )?;
    table::set_column(
        &batch,
        Field::new("SUB_CATEGORY", DataType::Utf8, false),
        Arc::new(subs),
    )
}

/// Deterministic supplier group for a (description, HS code) pair: sum the
/// scalar values of alphanumeric characters, modulo the group count.
fn synthetic_supplier(description: &str, hs_code: &str) -> String {
    let seed: u64 = description
        .chars()
        .chain(hs_code.chars())
        .filter(|c| c.is_alphanumeric())
        .map(|c| u64::from(c as u32))
        .sum();
    format!("Global Supplier Group-{}", seed % SUPPLIER_GROUPS + 1)
}

/// Ensure a SUPPLIER_NAME column exists. The branch is table-level: only when
/// the column is entirely absent from the schema is a synthetic supplier
/// generated; a present-but-blank column passes through untouched.
pub fn enrich_supplier(batch: &RecordBatch) -> Result<RecordBatch> {
    if table::column_index(batch, "SUPPLIER_NAME").is_some() {
        debug!("SUPPLIER_NAME present in source, leaving as-is");
        return Ok(batch.clone());
    }
    warn!("SUPPLIER_NAME missing from source, generating synthetic supplier groups");

    fn value_at<'a>(arr: Option<&'a StringArray>, i: usize) -> &'a str {
        match arr {
            Some(a) if !a.is_null(i) => a.value(i),
            _ => "",
        }
    }

    let n = batch.num_rows();
    let descs = table::str_column(batch, "GOODS_DESCRIPTION");
    let hs_codes = table::str_column(batch, "HS_CODE");

    let suppliers: StringArray = (0..n)
        .map(|i| Some(synthetic_supplier(value_at(descs, i), value_at(hs_codes, i))))
        .collect();

    table::set_column(
        batch,
        Field::new("SUPPLIER_NAME", DataType::Utf8, false),
        Arc::new(suppliers),
    )
}
