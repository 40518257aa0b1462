use common::{Error, Result};
use etl::Record;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::utils::fs::list_files;

/// Loads every bronze file (`*.jsonl` and `*.json`) under `dir` into one
/// working set, file by file in file-name order.
pub fn load_bronze_records(dir: &Path) -> Result<Vec<Record>> {
    if !dir.exists() {
        return Err(Error::SourceNotFound(format!(
            "bronze directory not found: {}",
            dir.display()
        )));
    }

    let files = list_files(dir, &["jsonl", "json"])?;
    if files.is_empty() {
        return Err(Error::SourceNotFound(format!(
            "no JSON/JSONL files found in {}",
            dir.display()
        )));
    }

    let mut records = Vec::new();
    for file in &files {
        let before = records.len();
        let content = fs::read_to_string(file)?;
        match file.extension().and_then(|e| e.to_str()) {
            Some("jsonl") => parse_json_lines(&content, file, &mut records)?,
            _ => parse_json_document(&content, file, &mut records)?,
        }
        debug!(file = %file.display(), records = records.len() - before, "Loaded bronze file");
    }

    info!(files = files.len(), records = records.len(), "Bronze working set loaded");
    Ok(records)
}

fn parse_json_lines(content: &str, file: &Path, out: &mut Vec<Record>) -> Result<()> {
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line)?;
        out.push(into_record(value, file, Some(idx + 1))?);
    }
    Ok(())
}

// A `.json` file is either one array of records or one record.
fn parse_json_document(content: &str, file: &Path, out: &mut Vec<Record>) -> Result<()> {
    if content.trim().is_empty() {
        return Ok(());
    }

    match serde_json::from_str::<Value>(content)? {
        Value::Array(items) => {
            for item in items {
                out.push(into_record(item, file, None)?);
            }
        }
        other => out.push(into_record(other, file, None)?),
    }
    Ok(())
}

fn into_record(value: Value, file: &Path, line: Option<usize>) -> Result<Record> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::InvalidInput(format!(
            "expected a JSON object in {}{}, found {}",
            file.display(),
            line.map(|l| format!(" line {}", l)).unwrap_or_default(),
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenates_jsonl_and_json_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("breweries_100000.jsonl"),
            "{\"id\":\"a\"}\n\n{\"id\":\"b\"}\n",
        )
        .unwrap();
        fs::write(dir.path().join("breweries_090000.json"), "[{\"id\":\"c\"}]").unwrap();
        fs::write(dir.path().join("single.json"), "{\"id\":\"d\"}").unwrap();

        let records = load_bronze_records(dir.path()).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r["id"].as_str().unwrap()).collect();

        assert_eq!(ids, vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn missing_or_empty_directory_is_source_not_found() {
        let dir = tempfile::tempdir().unwrap();

        let err = load_bronze_records(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, Error::SourceNotFound(_)));

        fs::write(dir.path().join("readme.txt"), "nothing here").unwrap();
        let err = load_bronze_records(dir.path()).unwrap_err();
        assert!(matches!(err, Error::SourceNotFound(_)));
    }

    #[test]
    fn rejects_non_object_lines() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.jsonl"), "{\"id\":1}\n[1,2]\n").unwrap();

        let err = load_bronze_records(dir.path()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
