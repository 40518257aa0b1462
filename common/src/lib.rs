use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;
use url::ParseError;

pub mod config;
pub mod context;
pub mod paths;
pub mod telemetry;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Forbidden - Access denied")]
    Forbidden,

    #[error("Gateway timeout")]
    GatewayTimeout,

    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Fetch failed for page {page} after {attempts} attempts: {reason}")]
    FetchFailed {
        page: u32,
        attempts: u32,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Schema validation error: {0}")]
    SchemaValidation(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::InvalidInput(format!("URL parse error: {}", err))
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(|p| p.display().to_string());
        match err.into_io_error() {
            Some(io) => Error::Io(io),
            None => Error::Storage(format!(
                "Directory walk failed at {}",
                path.unwrap_or_else(|| "<unknown>".to_string())
            )),
        }
    }
}

impl From<chrono::ParseError> for Error {
    fn from(err: chrono::ParseError) -> Self {
        Error::InvalidInput(format!("Date parse error: {}", err))
    }
}
