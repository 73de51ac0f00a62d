use std::path::PathBuf;

use thiserror::Error;

/// Failures of the storage layer. Duplicate names and unknown ids are not
/// errors; they come back as [`crate::models::AddOutcome`] /
/// [`crate::models::WriteOutcome`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not create data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("database pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    /// A transaction referenced a category id that does not exist.
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(failure, _))
                if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
        )
    }
}

/// Failures of CSV import/export.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("row {row}: amount `{value}` is not a number")]
    MalformedAmount { row: usize, value: String },
    #[error("row {row}: date `{value}` is not in YYYY-MM-DD format")]
    MalformedDate { row: usize, value: String },
    #[error("row {row}: unknown transaction type `{value}`")]
    UnknownKind { row: usize, value: String },
}

impl TransferError {
    /// Whether the failure was caused by the contents of the input file.
    pub fn is_malformed_input(&self) -> bool {
        match self {
            TransferError::MalformedAmount { .. }
            | TransferError::MalformedDate { .. }
            | TransferError::UnknownKind { .. } => true,
            TransferError::Csv(err) => !matches!(err.kind(), csv::ErrorKind::Io(_)),
            TransferError::Store(_) | TransferError::Io(_) => false,
        }
    }
}
