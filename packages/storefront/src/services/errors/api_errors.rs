use reqwest::StatusCode;
use std::fmt;

/// A dispatched call that did not produce a 2xx response.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    Http {
        status: StatusCode,
        message: Option<String>,
    },
    Network(String),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Network(_) => None,
        }
    }

    /// The `message` the server put in the error body, if any.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            ApiError::Http { message, .. } => message.as_deref(),
            ApiError::Network(_) => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::Http {
                status,
                message: Some(message),
            } => write!(f, "HTTP {}: {}", status, message),
            ApiError::Http {
                status,
                message: None,
            } => write!(f, "HTTP {}", status),
            ApiError::Network(msg) => write!(f, "Transport error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ValidationError,
    SessionExpired,
    Unauthorized,
    AccessDenied,
    NotFound,
    ServerError,
    NetworkError,
}

/// The single human-readable message a caller shows for a failed call.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedError {
    pub kind: ErrorKind,
    pub message: String,
}

impl NormalizedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        NormalizedError {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for NormalizedError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for NormalizedError {}

/// The transport could not produce any HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportError(pub String);

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Transport error: {}", self.0)
    }
}

impl std::error::Error for TransportError {}
