use chrono::{NaiveDate, Utc};
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::Result;

/// Directory layout of the three lakehouse layers under one data root.
#[derive(Debug, Clone)]
pub struct LayerPaths {
    data_root: PathBuf,
}

impl LayerPaths {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn bronze_root(&self) -> PathBuf {
        self.data_root.join("bronze")
    }

    pub fn silver_root(&self) -> PathBuf {
        self.data_root.join("silver")
    }

    pub fn gold_root(&self) -> PathBuf {
        self.data_root.join("gold")
    }

    pub fn bronze_dir(&self, ingestion_date: NaiveDate) -> PathBuf {
        self.bronze_root()
            .join(date_partition("ingestion_date", ingestion_date))
    }

    pub fn silver_dir(&self, ingestion_date: NaiveDate) -> PathBuf {
        self.silver_root()
            .join(date_partition("ingestion_date", ingestion_date))
    }

    pub fn gold_dir(&self, run_date: NaiveDate) -> PathBuf {
        self.gold_root().join(date_partition("run_date", run_date))
    }
}

pub fn date_partition(key: &str, date: NaiveDate) -> String {
    format!("{}={}", key, date.format("%Y-%m-%d"))
}

/// Creates a new file named `<prefix>_<HHMMSSmmm>.<extension>` in `dir`.
///
/// Never truncates an existing file: a name that is already taken gets a
/// numeric suffix instead.
pub fn create_timestamped_file(dir: &Path, prefix: &str, extension: &str) -> Result<(PathBuf, File)> {
    std::fs::create_dir_all(dir)?;
    let timestamp = Utc::now().format("%H%M%S%3f").to_string();

    let mut attempt = 0u32;
    loop {
        let file_name = if attempt == 0 {
            format!("{}_{}.{}", prefix, timestamp, extension)
        } else {
            format!("{}_{}_{}.{}", prefix, timestamp, attempt, extension)
        };
        let path = dir.join(file_name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e.into()),
        }
    }
}
