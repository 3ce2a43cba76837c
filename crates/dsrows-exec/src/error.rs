use thiserror::Error;

use dsrows_io::StoreError;
use dsrows_operators::CodecError;

/// Result type local to dsrows-exec.
pub type Result<T> = std::result::Result<T, ControllerError>;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("{0}")]
    NotFound(String),

    #[error("access denied")]
    AccessDenied,

    #[error("{message}")]
    InvalidInput {
        message: String,
        property: &'static str,
    },

    #[error("store error: {0}")]
    Store(StoreError),
}

impl ControllerError {
    pub fn http_status(&self) -> u16 {
        match self {
            ControllerError::NotFound(_) => 404,
            ControllerError::AccessDenied => 403,
            ControllerError::InvalidInput { .. } => 422,
            ControllerError::Store(_) => 500,
        }
    }
}

impl From<CodecError> for ControllerError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::InvalidInput { message, property } => {
                ControllerError::InvalidInput { message, property }
            }
        }
    }
}

impl From<StoreError> for ControllerError {
    fn from(e: StoreError) -> Self {
        if e.is_not_found() {
            ControllerError::NotFound(e.to_string())
        } else {
            ControllerError::Store(e)
        }
    }
}
