//! Error types for mturk-rs.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::response::ServiceError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("cannot read question template {}: {source}", path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service refused the call as a whole (bad signature, unknown operation, ...).
    #[error("{operation} failed with {code}: {message}")]
    Api {
        operation: String,
        code: String,
        message: String,
    },

    #[error("{operation} still throttled after {attempts} attempts")]
    Throttled { operation: String, attempts: u32 },

    /// `Request.IsValid` came back `False`.
    #[error("{operation} rejected: {}", ServiceError::summary(errors))]
    Rejected {
        operation: String,
        errors: Vec<ServiceError>,
    },

    #[error("malformed {operation} response: {message}")]
    MalformedResponse { operation: String, message: String },

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn malformed(operation: &str, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    /// Whether a retry of the same call could succeed.
    pub fn is_throttling(&self) -> bool {
        match self {
            Self::Api { code, .. } => code == crate::transport::SERVICE_UNAVAILABLE,
            Self::Throttled { .. } => true,
            _ => false,
        }
    }

    /// Short label used on metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Template { .. } => "template",
            Self::Http(_) => "http",
            Self::Api { .. } => "api",
            Self::Throttled { .. } => "throttled",
            Self::Rejected { .. } => "rejected",
            Self::MalformedResponse { .. } => "malformed",
            Self::Other(_) => "other",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
