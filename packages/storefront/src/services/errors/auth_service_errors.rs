use crate::repositories::errors::session_repository_errors::SessionRepositoryError;
use crate::services::errors::api_errors::NormalizedError;
use std::fmt;

#[derive(Debug)]
pub enum AuthServiceError {
    InvalidTokenFormat,
    AuthenticationFailed(String),
    RegistrationFailed(String),
    ValidationError(String),
    Api(NormalizedError),
    Storage(SessionRepositoryError),
}

impl fmt::Display for AuthServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthServiceError::InvalidTokenFormat => {
                write!(f, "Invalid token format received from server")
            }
            AuthServiceError::AuthenticationFailed(msg) => write!(f, "{}", msg),
            AuthServiceError::RegistrationFailed(msg) => write!(f, "{}", msg),
            AuthServiceError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AuthServiceError::Api(err) => write!(f, "{}", err),
            AuthServiceError::Storage(err) => write!(f, "Session storage error: {}", err),
        }
    }
}

impl std::error::Error for AuthServiceError {}

impl From<SessionRepositoryError> for AuthServiceError {
    fn from(error: SessionRepositoryError) -> Self {
        AuthServiceError::Storage(error)
    }
}

impl From<NormalizedError> for AuthServiceError {
    fn from(error: NormalizedError) -> Self {
        AuthServiceError::Api(error)
    }
}
