use anyhow::{bail, Context, Result};
use arrow::{
    array::{ArrayRef, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, warn};

/// Probe the fixed candidate locations for the raw export. An explicit path
/// (e.g. from the command line) short-circuits the probe but must exist.
pub fn locate_input(explicit: Option<&Path>, filename: &str) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        bail!("input file {} does not exist", path.display());
    }

    let candidates = [
        format!("data/raw/{filename}"),
        filename.to_string(),
        format!("../data/raw/{filename}"),
    ];
    for candidate in &candidates {
        let path = Path::new(candidate);
        if path.exists() {
            debug!(path = %path.display(), "found input");
            return Ok(path.to_path_buf());
        }
    }

    bail!("input file '{filename}' not found at any candidate location: {candidates:?}");
}

/// Read the raw export into an all-Utf8 record batch. Bytes are decoded as
/// UTF-8 first, falling back to Latin-1; empty fields become nulls.
pub fn read_batch(path: &Path) -> Result<RecordBatch> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let text = decode(&bytes);
    batch_from_csv(&text).with_context(|| format!("parsing {}", path.display()))
}

/// UTF-8 with Latin-1 fallback. ISO-8859-1 maps every byte straight to the
/// matching code point, so the fallback cannot fail.
fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            warn!("input is not valid UTF-8, falling back to Latin-1");
            bytes.iter().map(|&b| b as char).collect()
        }
    }
}

/// Parse CSV text (header row required) into a record batch where every
/// column is nullable Utf8. Ragged rows are tolerated; missing and empty
/// fields both come through as nulls.
pub fn batch_from_csv(text: &str) -> Result<RecordBatch> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(Cursor::new(text.as_bytes()));

    let headers: Vec<String> = rdr
        .headers()
        .context("reading CSV header row")?
        .iter()
        .map(|s| s.to_string())
        .collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        bail!("input CSV has no header row");
    }

    let mut records = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {idx}"))?;
        records.push(record);
    }
    debug!(rows = records.len(), columns = headers.len(), "parsed raw CSV");

    let columns: Vec<ArrayRef> = (0..headers.len())
        .map(|i| {
            let col: StringArray = records
                .iter()
                .map(|rec| rec.get(i).filter(|v| !v.is_empty()))
                .collect();
            Arc::new(col) as ArrayRef
        })
        .collect();

    let fields: Vec<Field> = headers
        .iter()
        .map(|name| Field::new(name, DataType::Utf8, true))
        .collect();

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
        .context("assembling record batch from CSV")
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_utf8_csv() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "Date,Goods Description")?;
        writeln!(tmp, "2024-01-05,STEEL SPOON")?;
        let batch = read_batch(tmp.path())?;
        assert_eq!(batch.num_rows(), 1);
        assert_eq!(batch.num_columns(), 2);
        Ok(())
    }

    #[test]
    fn falls_back_to_latin1() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        // 0xE9 is 'é' in ISO-8859-1 but invalid on its own in UTF-8
        tmp.write_all(b"NAME\nCAF\xC9 SET\n")?;
        let batch = read_batch(tmp.path())?;
        let col = crate::table::str_column(&batch, "NAME").expect("NAME column");
        assert_eq!(col.value(0), "CAF\u{c9} SET");
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_batch(Path::new("no/such/file.csv")).is_err());
    }

    #[test]
    fn locate_rejects_missing_explicit_path() {
        assert!(locate_input(Some(Path::new("no/such/file.csv")), "x.csv").is_err());
    }

    #[test]
    fn locate_fails_when_no_candidate_exists() {
        assert!(locate_input(None, "definitely_not_here_12345.csv").is_err());
    }

    #[test]
    fn empty_fields_become_nulls() -> Result<()> {
        let batch = batch_from_csv("A,B\n1,\n,2\n")?;
        let a = crate::table::str_column(&batch, "A").expect("A column");
        let b = crate::table::str_column(&batch, "B").expect("B column");
        assert_eq!(a.value(0), "1");
        assert!(a.is_null(1));
        assert!(b.is_null(0));
        assert_eq!(b.value(1), "2");
        Ok(())
    }

    #[test]
    fn ragged_rows_are_padded_with_nulls() -> Result<()> {
        let batch = batch_from_csv("A,B,C\n1,2\n")?;
        let c = crate::table::str_column(&batch, "C").expect("C column");
        assert!(c.is_null(0));
        Ok(())
    }

    #[test]
    fn headerless_input_is_rejected() {
        assert!(batch_from_csv("").is_err());
    }
}
