//! Error types for the skill matrix.

use thiserror::Error;

/// Result type alias for skill matrix operations.
pub type MatrixResult<T> = Result<T, MatrixError>;

/// Errors that can occur while editing, storing or exporting a matrix.
#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("row {0} is out of range")]
    RowOutOfRange(usize),

    #[error("column {col} is out of range for row {row}")]
    ColumnOutOfRange { row: usize, col: usize },

    #[error("unknown skill level: {0}")]
    UnknownLevel(String),

    #[error("unknown station: {0}")]
    UnknownStation(String),

    #[error("unknown person: {0}")]
    UnknownPerson(String),

    #[error("row {0} is backed by the roster and cannot be reassigned")]
    NotManual(usize),

    #[error("no line selected")]
    NoLineSelected,

    #[error("a save is already in progress")]
    SaveInProgress,

    #[error("no data to export")]
    NothingToExport,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "xlsx")]
    #[error("workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}
