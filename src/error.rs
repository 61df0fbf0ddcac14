/// Error Module
///
/// Typed failure kinds for the ETL pipeline. Each component raises its own
/// kind; the orchestrator propagates the first failure to its caller
/// unchanged.
use thiserror::Error;

pub type EtlResult<T> = Result<T, EtlError>;

#[derive(Debug, Error)]
pub enum EtlError {
    /// Missing or malformed configuration, detected before any network
    /// attempt
    #[error("configuration error: {0}")]
    Configuration(String),

    /// HTTP transport exhausted its retry budget, or the response envelope
    /// was semantically malformed
    #[error("extraction failed for {endpoint}: {reason}")]
    Extraction { endpoint: String, reason: String },

    /// A raw record is missing a required field or holds one of the wrong
    /// shape
    #[error("transformation failed for {category}: {reason}")]
    Transformation { category: &'static str, reason: String },

    /// Store connection, statement, or statement-file error
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl EtlError {
    pub fn extraction(endpoint: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Extraction { endpoint: endpoint.into(), reason: reason.to_string() }
    }

    pub fn transformation(category: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::Transformation { category, reason: reason.to_string() }
    }

    pub fn persistence(reason: impl std::fmt::Display) -> Self {
        Self::Persistence(reason.to_string())
    }
}
