use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, Float64Array, StringArray},
    datatypes::{Field, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;

/// Position of a named column, if present.
pub fn column_index(batch: &RecordBatch, name: &str) -> Option<usize> {
    let schema = batch.schema();
    schema.fields().iter().position(|f| f.name() == name)
}

/// Borrow a named column as a string array; `None` if absent or not Utf8.
pub fn str_column<'a>(batch: &'a RecordBatch, name: &str) -> Option<&'a StringArray> {
    column_index(batch, name).and_then(|i| batch.column(i).as_any().downcast_ref::<StringArray>())
}

/// Borrow a named column as a float array; `None` if absent or not Float64.
pub fn f64_column<'a>(batch: &'a RecordBatch, name: &str) -> Option<&'a Float64Array> {
    column_index(batch, name).and_then(|i| batch.column(i).as_any().downcast_ref::<Float64Array>())
}

/// Set a column on the batch: replaces in place when a column with the same
/// name already exists, otherwise appends it at the end. All other columns
/// are carried over untouched.
pub fn set_column(batch: &RecordBatch, field: Field, array: ArrayRef) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    let mut columns = batch.columns().to_vec();

    match fields.iter().position(|f| f.name() == field.name()) {
        Some(i) => {
            fields[i] = field;
            columns[i] = array;
        }
        None => {
            fields.push(field);
            columns.push(array);
        }
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
        .context("rebuilding record batch")
}
