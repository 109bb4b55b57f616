use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the storefront client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the storefront REST API
    pub base_url: String,
    /// File holding the persisted session; `None` keeps the session in memory
    pub session_file: Option<PathBuf>,
    /// Per-request timeout handed to the HTTP client
    pub request_timeout: Duration,
    /// Where callers are sent after a forced logout
    pub landing_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            session_file: None,
            request_timeout: Duration::from_secs(30),
            landing_path: "/".to_string(),
        }
    }
}

impl ClientConfig {
    /// Local backend with a short timeout
    pub fn development() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            ..Self::default()
        }
    }

    /// Reads `STOREFRONT_*` variables, falling back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env::var("STOREFRONT_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            session_file: env::var("STOREFRONT_SESSION_FILE")
                .ok()
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
            request_timeout: env::var("STOREFRONT_TIMEOUT_SECS")
                .ok()
                .and_then(|secs| secs.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            landing_path: env::var("STOREFRONT_LANDING_PATH").unwrap_or(defaults.landing_path),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }
}
