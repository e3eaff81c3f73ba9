use crate::table;
use anyhow::Result;
use arrow::{
    array::{Array, Float64Array, Int64Array, StringArray},
    datatypes::{DataType, Field},
    record_batch::RecordBatch,
};
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, warn};

static USD_PRICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"USD\s*[:\-\s]?\s*([0-9.]+)").expect("price regex should parse"));

static EMBEDDED_QTY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"QTY\s*[:\-\s]?\s*([0-9]+)").expect("qty regex should parse"));

/// Material keywords in priority order, first match wins. A description
/// mentioning both STEEL and GLASS is classified STEEL.
const MATERIAL_RULES: &[(&str, &str)] = &[
    ("STEEL", "STEEL"),
    ("GLASS", "GLASS"),
    ("PLASTIC", "PLASTIC"),
    ("WOOD", "WOODEN"),
];

#[derive(Debug, Clone)]
struct Extracted {
    model: String,
    material: &'static str,
    embedded_qty: Option<i64>,
    usd_price: Option<f64>,
}

/// Pull structured fields out of one free-text description. Never fails:
/// anything unparseable degrades to `None` or UNKNOWN.
fn parse_description(raw: &str) -> Extracted {
    let text = raw.to_uppercase();

    let usd_price = USD_PRICE_RE
        .captures(&text)
        .and_then(|c| c[1].parse::<f64>().ok());
    let embedded_qty = EMBEDDED_QTY_RE
        .captures(&text)
        .and_then(|c| c[1].parse::<i64>().ok());

    let material = MATERIAL_RULES
        .iter()
        .find(|(keyword, _)| text.contains(keyword))
        .map(|(_, label)| *label)
        .unwrap_or("UNKNOWN");

    let model = text
        .split_whitespace()
        .next()
        .unwrap_or("UNKNOWN")
        .to_string();

    Extracted {
        model,
        material,
        embedded_qty,
        usd_price,
    }
}

/// Append EXTRACTED_MODEL, EXTRACTED_MATERIAL, EMBEDDED_QTY and
/// EXTRACTED_USD_PRICE from the GOODS_DESCRIPTION column. Existing columns
/// are never mutated; a null description yields nulls for all four outputs.
/// Rows are independent, so extraction runs row-parallel.
pub fn parse_descriptions(batch: &RecordBatch) -> Result<RecordBatch> {
    let n = batch.num_rows();

    let extracted: Vec<Option<Extracted>> = match table::str_column(batch, "GOODS_DESCRIPTION") {
        Some(descs) => (0..n)
            .into_par_iter()
            .map(|i| {
                if descs.is_null(i) {
                    None
                } else {
                    Some(parse_description(descs.value(i)))
                }
            })
            .collect(),
        None => {
            warn!("no GOODS_DESCRIPTION column, extracted fields will be null");
            vec![None; n]
        }
    };
    debug!(
        parsed = extracted.iter().filter(|e| e.is_some()).count(),
        rows = n,
        "description parsing done"
    );

    let models: StringArray = extracted
        .iter()
        .map(|e| e.as_ref().map(|x| x.model.as_str()))
        .collect();
    let materials: StringArray = extracted
        .iter()
        .map(|e| e.as_ref().map(|x| x.material))
        .collect();
    let qtys: Int64Array = extracted
        .iter()
        .map(|e| e.as_ref().and_then(|x| x.embedded_qty))
        .collect();
    let prices: Float64Array = extracted
        .iter()
        .map(|e| e.as_ref().and_then(|x| x.usd_price))
        .collect();

    let batch = table::set_column(
        batch,
        Field::new("EXTRACTED_MODEL", DataType::Utf8, true),
        Arc::new(models),
    )?;
    let batch = table::set_column(
        &batch,
        Field::new("EXTRACTED_MATERIAL", DataType::Utf8, true),
        Arc::new(materials),
    )?;
    let batch = table::set_column(
        &batch,
        Field::new("EMBEDDED_QTY", DataType::Int64, true),
        Arc::new(qtys),
    )?;
    table::set_column(
        &batch,
        Field::new("EXTRACTED_USD_PRICE", DataType::Float64, true),
        Arc::new(prices),
    )
}
