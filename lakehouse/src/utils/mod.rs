pub mod arrow;
pub mod fs;
pub mod parquet;
