use arrow::datatypes::SchemaRef;
use chrono::NaiveDate;
use common::Result;
use etl::models::field_as_str;
use etl::Record;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::transform::records_to_batches;
use crate::utils::parquet::write_parquet;

pub const PARTITION_FILE_NAME: &str = "part-0.parquet";

const FORBIDDEN_PATH_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Makes a partition value safe to use as a single directory name.
pub fn sanitize_partition_value(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|c| if FORBIDDEN_PATH_CHARS.contains(&c) { '_' } else { c })
        .collect();

    if cleaned.is_empty() {
        return "unknown".to_string();
    }
    // "." and ".." would escape the partition directory.
    if cleaned.chars().all(|c| c == '.') {
        return "_".repeat(cleaned.len());
    }
    cleaned
}

pub struct PartitionWriter {
    schema: SchemaRef,
    ingestion_date: NaiveDate,
}

impl PartitionWriter {
    pub fn new(schema: SchemaRef, ingestion_date: NaiveDate) -> Self {
        Self {
            schema,
            ingestion_date,
        }
    }

    /// Writes `records` under `<out_dir>/<country>/<state>/part-0.parquet`,
    /// replacing any file already there. Returns the written paths in
    /// partition order.
    pub fn write_partitioned(&self, records: &[Record], out_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut partitions: BTreeMap<(String, String), Vec<&Record>> = BTreeMap::new();
        for record in records {
            let key = (
                sanitize_partition_value(field_as_str(record, "country").unwrap_or_default()),
                sanitize_partition_value(field_as_str(record, "state").unwrap_or_default()),
            );
            partitions.entry(key).or_default().push(record);
        }

        let mut written = Vec::with_capacity(partitions.len());
        for ((country, state), rows) in partitions {
            let dir = out_dir.join(&country).join(&state);
            fs::create_dir_all(&dir)?;

            let batches = records_to_batches(&rows, self.schema.clone())?;
            let path = dir.join(PARTITION_FILE_NAME);
            write_parquet(
                File::create(&path)?,
                self.schema.clone(),
                &batches,
                &[
                    ("layer", "silver".to_string()),
                    ("ingestion_date", self.ingestion_date.to_string()),
                ],
            )?;

            debug!(country = %country, state = %state, rows = rows.len(), "Wrote silver partition");
            written.push(path);
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_separators_and_blanks() {
        assert_eq!(sanitize_partition_value("  Texas "), "Texas");
        assert_eq!(sanitize_partition_value("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize_partition_value("what?*<>|\""), "what______");
        assert_eq!(sanitize_partition_value("   "), "unknown");
        assert_eq!(sanitize_partition_value(""), "unknown");
        assert_eq!(sanitize_partition_value(".."), "__");
        assert_eq!(sanitize_partition_value("St. Louis"), "St. Louis");
    }
}
