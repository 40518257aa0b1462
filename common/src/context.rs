use chrono::NaiveDate;
use uuid::Uuid;

use crate::config::Settings;
use crate::paths::LayerPaths;
use crate::{Error, Result};

/// Everything a stage needs for one run. Built once and never re-read from the
/// environment or the clock afterwards.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub settings: Settings,
    pub paths: LayerPaths,
    pub run_date: NaiveDate,
    pub run_id: String,
}

impl RunContext {
    pub fn new(settings: Settings, run_date: NaiveDate) -> Self {
        let run_id = format!("{}_{}", run_date.format("%Y-%m-%d"), Uuid::new_v4().simple());
        Self::with_run_id(settings, run_date, run_id)
    }

    pub fn with_run_id(settings: Settings, run_date: NaiveDate, run_id: impl Into<String>) -> Self {
        let paths = LayerPaths::new(settings.data_root.clone());
        Self {
            settings,
            paths,
            run_date,
            run_id: run_id.into(),
        }
    }

    pub fn pipeline_id(&self) -> &str {
        &self.settings.pipeline_id
    }
}

/// Parses a logical run date in `YYYY-MM-DD` form.
pub fn parse_run_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        Error::InvalidInput(format!("run date '{}' is not YYYY-MM-DD: {}", value, e))
    })
}
