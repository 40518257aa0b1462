use arrow::array::{Array, ArrayRef, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use common::Result;
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::schema::{gold_schema, GOLD_KEY_COLUMNS};
use crate::utils::arrow::string_column;

/// A grouping value that sorts nulls after every non-null value.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NullsLast(Option<String>);

impl Ord for NullsLast {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl PartialOrd for NullsLast {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Counts rows per `(country, state, brewery_type, city)`, using only the key
/// columns present in `batch`. Groups come out sorted by key with nulls last,
/// whatever the input row order.
pub fn aggregate_by_type_and_location(batch: &RecordBatch) -> Result<RecordBatch> {
    let keys: Vec<&str> = GOLD_KEY_COLUMNS
        .iter()
        .copied()
        .filter(|name| batch.column_by_name(name).is_some())
        .collect();
    let columns = keys
        .iter()
        .map(|name| string_column(batch, name))
        .collect::<Result<Vec<_>>>()?;

    let mut groups: BTreeMap<Vec<NullsLast>, i64> = BTreeMap::new();
    for row in 0..batch.num_rows() {
        let key = columns
            .iter()
            .map(|column| NullsLast(column.is_valid(row).then(|| column.value(row).to_string())))
            .collect();
        *groups.entry(key).or_insert(0) += 1;
    }

    let mut output: Vec<ArrayRef> = (0..keys.len())
        .map(|i| {
            let values: StringArray = groups.keys().map(|key| key[i].0.as_deref()).collect();
            Arc::new(values) as ArrayRef
        })
        .collect();
    output.push(Arc::new(groups.values().map(|count| Some(*count)).collect::<Int64Array>()));

    Ok(RecordBatch::try_new(Arc::new(gold_schema(&keys)), output)?)
}

/// SHA-256 over the group keys and counts of an aggregated batch. Identical
/// groups give an identical digest.
pub fn content_checksum(aggregated: &RecordBatch) -> Result<String> {
    let schema = aggregated.schema();
    let key_names: Vec<&str> = schema
        .fields()
        .iter()
        .map(|f| f.name().as_str())
        .filter(|name| GOLD_KEY_COLUMNS.contains(name))
        .collect();
    let keys = key_names
        .iter()
        .map(|name| string_column(aggregated, name))
        .collect::<Result<Vec<_>>>()?;
    let counts = aggregated
        .column(aggregated.num_columns() - 1)
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| common::Error::SchemaMismatch("gold count column is not Int64".to_string()))?;

    let mut hasher = Sha256::new();
    hasher.update(key_names.join("\t").as_bytes());
    hasher.update(b"\n");
    for row in 0..aggregated.num_rows() {
        for key in &keys {
            if key.is_valid(row) {
                hasher.update(key.value(row).as_bytes());
            } else {
                hasher.update(b"\\N");
            }
            hasher.update(b"\t");
        }
        hasher.update(counts.value(row).to_string().as_bytes());
        hasher.update(b"\n");
    }

    Ok(format!("{:x}", hasher.finalize()))
}
