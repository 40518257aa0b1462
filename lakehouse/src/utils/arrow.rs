use arrow::array::{new_null_array, Array, ArrayRef, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use common::{Error, Result};
use std::sync::Arc;

/// Returns `name` as a Utf8 column, casting other types and materializing an
/// all-null column when the batch does not have it.
pub fn utf8_column_or_nulls(batch: &RecordBatch, name: &str) -> Result<ArrayRef> {
    match batch.column_by_name(name) {
        Some(column) if column.data_type() == &DataType::Utf8 => Ok(Arc::clone(column)),
        Some(column) => Ok(cast(column, &DataType::Utf8)?),
        None => Ok(new_null_array(&DataType::Utf8, batch.num_rows())),
    }
}

pub fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    let column = batch.column_by_name(name).ok_or_else(|| {
        Error::SchemaMismatch(format!("column '{}' not found in batch", name))
    })?;

    column
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| {
            Error::SchemaMismatch(format!(
                "column '{}' is {:?}, expected Utf8",
                name,
                column.data_type()
            ))
        })
}

pub fn string_values(array: &StringArray) -> Vec<Option<String>> {
    array.iter().map(|v| v.map(str::to_string)).collect()
}
