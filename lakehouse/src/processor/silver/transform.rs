use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::error::ArrowError;
use arrow::json::reader::{infer_json_schema_from_iterator, ReaderBuilder};
use arrow::record_batch::RecordBatch;
use common::{Error, Result};
use etl::Record;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::warn;

use crate::schema::{PARTITION_FIELDS, STRING_FIELDS};

const DECODE_BATCH_SIZE: usize = 1024;

/// `null`/absent → `""`, strings trimmed, other values trimmed in their
/// textual form.
pub fn safe_stringify(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string().trim().to_string(),
    }
}

/// Applies `safe_stringify` to the silver string fields of every record.
///
/// Fails when no record carries a partition field at all; other fields pass
/// through untouched.
pub fn normalize_fields(mut records: Vec<Record>) -> Result<Vec<Record>> {
    let missing: Vec<&str> = PARTITION_FIELDS
        .iter()
        .copied()
        .filter(|field| !records.iter().any(|r| r.contains_key(*field)))
        .collect();

    if !missing.is_empty() {
        return Err(Error::SchemaMismatch(format!(
            "missing required columns for partitioning: {:?}",
            missing
        )));
    }

    for record in &mut records {
        for field in STRING_FIELDS {
            let cleaned = safe_stringify(record.get(field));
            record.insert(field.to_string(), Value::String(cleaned));
        }
    }

    let drifting = stringify_drifting_fields(&mut records);
    if !drifting.is_empty() {
        warn!(fields = ?drifting, "Fields change shape between records, storing them as JSON text");
    }

    Ok(records)
}

/// Finds pass-through fields whose values cannot share one Arrow type (an
/// object in one record and a scalar in another, say) and replaces their
/// non-null values with JSON text. Returns the affected field names.
pub fn stringify_drifting_fields(records: &mut [Record]) -> Vec<String> {
    let keys: BTreeSet<String> = records
        .iter()
        .flat_map(|r| r.keys().cloned())
        .filter(|k| !STRING_FIELDS.contains(&k.as_str()))
        .collect();

    let drifting: Vec<String> = keys
        .into_iter()
        .filter(|key| {
            let values = records.iter().filter_map(|r| r.get(key)).map(|v| {
                let mut single = Map::new();
                single.insert(key.clone(), v.clone());
                Ok::<_, ArrowError>(Value::Object(single))
            });
            infer_json_schema_from_iterator(values).is_err()
        })
        .collect();

    for record in records.iter_mut() {
        for key in &drifting {
            if let Some(value) = record.get_mut(key) {
                if !matches!(value, Value::Null | Value::String(_)) {
                    *value = Value::String(value.to_string());
                }
            }
        }
    }

    drifting
}

/// Infers one Arrow schema for the whole working set so every partition of a
/// run is written with the same columns.
pub fn infer_silver_schema(records: &[Record]) -> Result<SchemaRef> {
    let inferred = infer_json_schema_from_iterator(
        records.iter().map(|r| Ok(Value::Object(r.clone()))),
    )?;

    let fields: Vec<Field> = inferred
        .fields()
        .iter()
        .map(|field| {
            let data_type = if STRING_FIELDS.contains(&field.name().as_str())
                || field.data_type() == &DataType::Null
            {
                DataType::Utf8
            } else {
                field.data_type().clone()
            };
            Field::new(field.name(), data_type, true)
        })
        .collect();

    Ok(Arc::new(Schema::new(fields)))
}

/// Decodes records into record batches of `schema`. Values whose JSON type
/// disagrees with a string column are kept in their textual form.
pub fn records_to_batches(records: &[&Record], schema: SchemaRef) -> Result<Vec<RecordBatch>> {
    let mut decoder = ReaderBuilder::new(schema)
        .with_batch_size(DECODE_BATCH_SIZE)
        .with_coerce_primitive(true)
        .build_decoder()?;

    let mut batches = Vec::new();
    for chunk in records.chunks(DECODE_BATCH_SIZE) {
        decoder.serialize(chunk)?;
        if let Some(batch) = decoder.flush()? {
            batches.push(batch);
        }
    }

    Ok(batches)
}
