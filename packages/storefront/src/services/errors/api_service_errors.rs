use crate::services::errors::api_errors::NormalizedError;
use reqwest::StatusCode;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ApiServiceError {
    /// Input rejected before any request was sent.
    Validation(String),
    /// Generic normalized failure of a dispatched call.
    Api(NormalizedError),
    /// Failure reworded for a specific endpoint.
    Rejected {
        status: Option<StatusCode>,
        message: String,
    },
}

impl ApiServiceError {
    pub fn rejected(status: Option<StatusCode>, message: impl Into<String>) -> Self {
        ApiServiceError::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiServiceError::Validation(msg) => msg,
            ApiServiceError::Api(err) => &err.message,
            ApiServiceError::Rejected { message, .. } => message,
        }
    }
}

impl fmt::Display for ApiServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ApiServiceError {}

impl From<NormalizedError> for ApiServiceError {
    fn from(error: NormalizedError) -> Self {
        ApiServiceError::Api(error)
    }
}
