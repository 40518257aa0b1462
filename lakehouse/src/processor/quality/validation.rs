use arrow::array::{Array, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use common::{Error, Result};
use std::collections::BTreeSet;
use std::fmt;

use crate::schema::is_allowed_brewery_type;

struct ColumnRule {
    name: &'static str,
    nullable: bool,
    restrict_to_allow_list: bool,
}

const SILVER_RULES: [ColumnRule; 4] = [
    ColumnRule { name: "country", nullable: true, restrict_to_allow_list: false },
    ColumnRule { name: "state", nullable: true, restrict_to_allow_list: false },
    ColumnRule { name: "city", nullable: true, restrict_to_allow_list: false },
    ColumnRule { name: "brewery_type", nullable: false, restrict_to_allow_list: true },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    MissingColumn(String),
    WrongType { column: String, found: DataType },
    NullValues { column: String, count: usize },
    OutOfDomain { column: String, values: Vec<String> },
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaViolation::MissingColumn(column) => write!(f, "column '{}' is missing", column),
            SchemaViolation::WrongType { column, found } => {
                write!(f, "column '{}' is {:?}, expected Utf8", column, found)
            }
            SchemaViolation::NullValues { column, count } => {
                write!(f, "column '{}' has {} null value(s) but is not nullable", column, count)
            }
            SchemaViolation::OutOfDomain { column, values } => {
                write!(f, "column '{}' has values outside the allow-list: {:?}", column, values)
            }
        }
    }
}

/// Checks every rule against `batch` and returns all violations found rather
/// than stopping at the first one.
pub fn collect_violations(batch: &RecordBatch) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();

    for rule in &SILVER_RULES {
        let Some(column) = batch.column_by_name(rule.name) else {
            violations.push(SchemaViolation::MissingColumn(rule.name.to_string()));
            continue;
        };
        let Some(values) = column.as_any().downcast_ref::<StringArray>() else {
            violations.push(SchemaViolation::WrongType {
                column: rule.name.to_string(),
                found: column.data_type().clone(),
            });
            continue;
        };

        if !rule.nullable && values.null_count() > 0 {
            violations.push(SchemaViolation::NullValues {
                column: rule.name.to_string(),
                count: values.null_count(),
            });
        }

        if rule.restrict_to_allow_list {
            let outside: BTreeSet<&str> = values
                .iter()
                .flatten()
                .filter(|v| !is_allowed_brewery_type(v))
                .collect();
            if !outside.is_empty() {
                violations.push(SchemaViolation::OutOfDomain {
                    column: rule.name.to_string(),
                    values: outside.into_iter().map(str::to_string).collect(),
                });
            }
        }
    }

    violations
}

pub fn validate_silver_batch(batch: &RecordBatch) -> Result<()> {
    let violations = collect_violations(batch);
    if violations.is_empty() {
        return Ok(());
    }

    let details: Vec<String> = violations.iter().map(ToString::to_string).collect();
    Err(Error::SchemaValidation(format!(
        "{} violation(s): {}",
        violations.len(),
        details.join("; ")
    )))
}
