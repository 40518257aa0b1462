use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use lazy_static::lazy_static;
use std::sync::Arc;

/// Fields the silver layer always stores as trimmed, non-null strings.
pub const STRING_FIELDS: [&str; 5] = ["country", "state", "city", "brewery_type", "name"];

/// Fields the silver layer is partitioned by, outermost first.
pub const PARTITION_FIELDS: [&str; 2] = ["country", "state"];

/// Columns the quality gate and gold aggregator read back from silver.
pub const SILVER_KEY_COLUMNS: [&str; 4] = ["country", "state", "city", "brewery_type"];

/// Gold grouping keys, in sort-precedence order.
pub const GOLD_KEY_COLUMNS: [&str; 4] = ["country", "state", "brewery_type", "city"];

pub const GOLD_COUNT_COLUMN: &str = "n_breweries";

pub const ALLOWED_BREWERY_TYPES: [&str; 12] = [
    "micro",
    "brewpub",
    "planning",
    "regional",
    "contract",
    "large",
    "nano",
    "bar",
    "proprietor",
    "closed",
    "taproom",
    "beergarden",
];

pub fn is_allowed_brewery_type(value: &str) -> bool {
    ALLOWED_BREWERY_TYPES.contains(&value)
}

// Silver projection read by quality and gold: every key column is a nullable
// string so a missing column never collapses to the Null type.
pub fn silver_key_schema() -> Schema {
    Schema::new(
        SILVER_KEY_COLUMNS
            .iter()
            .map(|name| Field::new(*name, DataType::Utf8, true))
            .collect::<Vec<_>>(),
    )
}

pub fn gold_schema(key_columns: &[&str]) -> Schema {
    let mut fields: Vec<Field> = key_columns
        .iter()
        .map(|name| Field::new(*name, DataType::Utf8, true))
        .collect();
    fields.push(Field::new(GOLD_COUNT_COLUMN, DataType::Int64, false));
    Schema::new(fields)
}

pub fn silver_key_schema_ref() -> SchemaRef {
    SILVER_KEY_SCHEMA.clone()
}

// Lazy-loaded static schemas
lazy_static! {
    static ref SILVER_KEY_SCHEMA: SchemaRef = Arc::new(silver_key_schema());
}
