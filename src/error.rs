/// Error types for loading a harvest workbook and writing report files.
use thiserror::Error;

/// Failures that abort a run. Bad cells never end up here; they are coerced
/// to unknown values by the loader instead.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Reading or writing a file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input is not well-formed delimited text
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The file has no header row to match columns against
    #[error("File has no header row: {0}")]
    MissingHeaders(String),

    /// A binary workbook was supplied instead of its CSV export
    #[error("Unsupported file format '{0}': export the workbook sheet as CSV first")]
    UnsupportedFormat(String),

    /// The JSON summary could not be encoded
    #[error("Failed to encode summary: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type alias for Results using ReportError
pub type Result<T> = std::result::Result<T, ReportError>;
