// src/bin/verify.rs
//
// Quick check of the database produced by a pipeline run: row count plus a
// preview of the first few shipments.

use anyhow::{Context, Result};
use rusqlite::{types::ValueRef, Connection};

const DB_PATH: &str = "trade_analysis.db";
const TABLE: &str = "shipments";
const PREVIEW_ROWS: usize = 3;

fn main() -> Result<()> {
    let conn =
        Connection::open(DB_PATH).with_context(|| format!("opening database {DB_PATH}"))?;

    let count: i64 = conn
        .query_row(&format!("SELECT COUNT(*) FROM \"{TABLE}\""), [], |r| r.get(0))
        .with_context(|| format!("counting rows in '{TABLE}'"))?;
    println!("{DB_PATH}: {count} rows in '{TABLE}'\n");

    let mut stmt = conn.prepare(&format!("SELECT * FROM \"{TABLE}\" LIMIT {PREVIEW_ROWS}"))?;
    let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
    println!("{}", names.join(" | "));

    let ncols = names.len();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let cells: Vec<String> = (0..ncols)
            .map(|i| row.get_ref(i).map(render).unwrap_or_else(|_| "?".into()))
            .collect();
        println!("{}", cells.join(" | "));
    }

    Ok(())
}

fn render(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<{} bytes>", b.len()),
    }
}
