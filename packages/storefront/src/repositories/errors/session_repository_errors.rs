#[derive(Debug)]
pub enum SessionRepositoryError {
    Io(String),
    Serialization(String),
}

impl std::fmt::Display for SessionRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionRepositoryError::Io(msg) => write!(f, "Storage I/O error: {}", msg),
            SessionRepositoryError::Serialization(msg) => {
                write!(f, "Storage serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for SessionRepositoryError {}

impl From<std::io::Error> for SessionRepositoryError {
    fn from(error: std::io::Error) -> Self {
        SessionRepositoryError::Io(error.to_string())
    }
}

impl From<serde_json::Error> for SessionRepositoryError {
    fn from(error: serde_json::Error) -> Self {
        SessionRepositoryError::Serialization(error.to_string())
    }
}
