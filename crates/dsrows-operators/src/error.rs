use thiserror::Error;

/// Structural violations detected while turning request parameters into a row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("{message}")]
    InvalidInput {
        message: String,
        /// Offending request property, for form highlighting.
        property: &'static str,
    },
}

impl CodecError {
    pub fn invalid(message: impl Into<String>, property: &'static str) -> Self {
        CodecError::InvalidInput {
            message: message.into(),
            property,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterParseError {
    #[error("unparseable filter clause: {0}")]
    Clause(String),

    #[error("unterminated string literal in filter: {0}")]
    Unterminated(String),
}
