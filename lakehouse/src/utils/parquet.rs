use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use common::Result;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use parquet::format::KeyValue;
use std::fs::File;
use std::path::Path;

/// Writes `batches` as one Parquet file, tagging the footer with `metadata`.
/// An empty slice still produces a valid file carrying `schema`.
pub fn write_parquet(
    file: File,
    schema: SchemaRef,
    batches: &[RecordBatch],
    metadata: &[(&str, String)],
) -> Result<()> {
    let writer_props = WriterProperties::builder()
        .set_key_value_metadata(Some(
            metadata
                .iter()
                .map(|(key, value)| KeyValue {
                    key: key.to_string(),
                    value: Some(value.clone()),
                })
                .collect::<Vec<KeyValue>>(),
        ))
        .build();

    let mut writer = ArrowWriter::try_new(file, schema, Some(writer_props))?;
    for batch in batches {
        writer.write(batch)?;
    }
    writer.close()?;

    Ok(())
}

pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch?);
    }
    Ok(batches)
}
