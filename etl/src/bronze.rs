use chrono::NaiveDate;
use common::paths::{create_timestamped_file, LayerPaths};
use common::Result;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

use crate::models::Record;

/// Append-only writer for the bronze layer.
///
/// Every call produces a new `breweries_<timestamp>.jsonl` file under the
/// ingestion date partition; earlier batches for the same date are kept.
pub struct BronzeWriter {
    paths: LayerPaths,
}

impl BronzeWriter {
    pub fn new(paths: LayerPaths) -> Self {
        Self { paths }
    }

    pub fn write_batch(&self, records: &[Record], ingestion_date: NaiveDate) -> Result<PathBuf> {
        let dir = self.paths.bronze_dir(ingestion_date);
        let (path, file) = create_timestamped_file(&dir, "breweries", "jsonl")?;

        let mut writer = BufWriter::new(file);
        for record in records {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        info!(path = %path.display(), records = records.len(), "Bronze batch written");
        Ok(path)
    }
}
