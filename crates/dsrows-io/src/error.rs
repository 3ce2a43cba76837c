use thiserror::Error;

use dsrows_core::id::{DataSetId, MediaId, RowId};
use dsrows_operators::FilterParseError;

/// Result type local to dsrows-io.
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("dataset {0} not found")]
    DataSetNotFound(DataSetId),

    #[error("row {row_id} not found in dataset {data_set_id}")]
    RowNotFound {
        data_set_id: DataSetId,
        row_id: RowId,
    },

    #[error("media {0} not found")]
    MediaNotFound(MediaId),

    #[error("invalid filter: {0}")]
    Filter(#[from] FilterParseError),

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("storage I/O error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serde(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::DataSetNotFound(_)
                | StoreError::RowNotFound { .. }
                | StoreError::MediaNotFound(_)
        )
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serde(e.to_string())
    }
}

impl From<dsrows_core::error::Error> for StoreError {
    fn from(e: dsrows_core::error::Error) -> Self {
        StoreError::Schema(e.to_string())
    }
}
