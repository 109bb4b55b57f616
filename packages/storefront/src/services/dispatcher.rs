use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::models::http::{ApiRequest, ApiResponse, FormPart, RequestBody};
use crate::services::errors::api_errors::{ApiError, ErrorKind, NormalizedError, TransportError};
use crate::services::session_service::SessionStore;
use crate::services::token_service::is_token_usable;

#[cfg(test)]
use mockall::automock;

/// Paths that must never carry a credential.
pub const PUBLIC_ENDPOINTS: [&str; 2] = ["/auth/login", "/auth/register"];

pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please login again.";
pub const UNAUTHORIZED_MESSAGE: &str =
    "Unauthorized. Your account may not have the required permissions.";
pub const ACCESS_DENIED_MESSAGE: &str = "Access denied. Insufficient privileges.";
pub const NOT_FOUND_MESSAGE: &str = "Resource not found.";
pub const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";

/// The bare HTTP call the dispatcher decorates.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Receives the forced navigation that follows an unrecoverable 401.
#[cfg_attr(test, automock)]
pub trait Navigator: Send + Sync {
    fn redirect_to(&self, path: &str);
}

/// Default navigator for headless use: records the redirect in the log.
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect_to(&self, path: &str) {
        info!("Session ended, redirecting to {}", path);
    }
}

pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError(e.to_string()))?;
        Ok(ReqwestTransport {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn build_form(parts: Vec<FormPart>) -> Result<Form, TransportError> {
        let mut form = Form::new();
        for part in parts {
            form = match part {
                FormPart::Text { name, value } => form.text(name, value),
                FormPart::File {
                    name,
                    file_name,
                    content_type,
                    bytes,
                } => {
                    let mut file = Part::bytes(bytes).file_name(file_name);
                    if let Some(content_type) = content_type {
                        file = file
                            .mime_str(&content_type)
                            .map_err(|e| TransportError(e.to_string()))?;
                    }
                    form.part(name, file)
                }
            };
        }
        Ok(form)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self
            .client
            .request(request.method, url)
            .headers(request.headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Multipart(parts) => builder.multipart(Self::build_form(parts)?),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        Ok(ApiResponse::new(status, body.to_vec()))
    }
}

/// Wraps a transport with the session's header and 401 policies.
pub struct RequestDispatcher {
    transport: Arc<dyn HttpTransport>,
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    landing_path: String,
}

impl RequestDispatcher {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        RequestDispatcher {
            transport,
            session,
            navigator,
            landing_path: "/".to_string(),
        }
    }

    pub fn with_landing_path(mut self, landing_path: impl Into<String>) -> Self {
        self.landing_path = landing_path.into();
        self
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn is_public_endpoint(path: &str) -> bool {
        PUBLIC_ENDPOINTS
            .iter()
            .any(|endpoint| path.contains(endpoint))
    }

    /// Applies the header policy using the session as it is right now.
    pub async fn prepare(&self, mut request: ApiRequest) -> ApiRequest {
        request.headers.remove(AUTHORIZATION);

        if Self::is_public_endpoint(&request.path) {
            debug!("{} is a public endpoint, no credential attached", request.path);
            return request;
        }

        match self.session.token().await {
            Some(token) => match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    request.headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("Stored token is not a valid header value, sending without it"),
            },
            None => debug!("No usable token for {}", request.path),
        }
        request
    }

    /// Sends one request. Non-2xx responses come back as `ApiError::Http`,
    /// transport failures as `ApiError::Network`.
    pub async fn dispatch(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let request = self.prepare(request).await;
        let public = Self::is_public_endpoint(&request.path);
        let method = request.method.clone();
        let path = request.path.clone();

        let response = self.transport.send(request).await.map_err(|e| {
            error!("{} {} failed: {}", method, path, e);
            ApiError::Network(e.0)
        })?;

        if response.is_success() {
            return Ok(response);
        }

        if response.status == StatusCode::UNAUTHORIZED && !public {
            self.handle_unauthorized(&path).await;
        }

        Err(ApiError::Http {
            status: response.status,
            message: response.remote_message(),
        })
    }

    /// Dispatches and normalizes any failure into a displayable error.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, NormalizedError> {
        match self.dispatch(request).await {
            Ok(response) => Ok(response),
            Err(e) => Err(self.handle_api_error(&e).await),
        }
    }

    pub async fn handle_api_error(&self, error: &ApiError) -> NormalizedError {
        let has_token = self.session.stored_token().await.is_some();
        normalize_error(error, has_token)
    }

    // A 401 only ends the session when there was no usable token to begin
    // with. A live token being rejected is a permissions problem.
    async fn handle_unauthorized(&self, path: &str) {
        let usable = self
            .session
            .stored_token()
            .await
            .map_or(false, |token| is_token_usable(&token));

        if usable {
            warn!("{} rejected a valid session, keeping it", path);
            return;
        }

        info!("{} returned 401 without a valid session, logging out", path);
        if let Err(e) = self.session.logout().await {
            warn!("Forced logout incomplete: {}", e);
        }
        self.navigator.redirect_to(&self.landing_path);
    }
}

/// Maps any failed call to exactly one error kind and message.
pub fn normalize_error(error: &ApiError, has_token: bool) -> NormalizedError {
    match error {
        ApiError::Http { status, message } => match status.as_u16() {
            400 => NormalizedError::new(
                ErrorKind::ValidationError,
                format!(
                    "Validation Error: {}",
                    message.as_deref().unwrap_or("Invalid request")
                ),
            ),
            401 if has_token => NormalizedError::new(ErrorKind::Unauthorized, UNAUTHORIZED_MESSAGE),
            401 => NormalizedError::new(ErrorKind::SessionExpired, SESSION_EXPIRED_MESSAGE),
            403 => NormalizedError::new(ErrorKind::AccessDenied, ACCESS_DENIED_MESSAGE),
            404 => NormalizedError::new(ErrorKind::NotFound, NOT_FOUND_MESSAGE),
            500 => NormalizedError::new(ErrorKind::ServerError, SERVER_ERROR_MESSAGE),
            _ => NormalizedError::new(
                ErrorKind::NetworkError,
                message.clone().unwrap_or_else(|| NETWORK_ERROR_MESSAGE.to_string()),
            ),
        },
        ApiError::Network(_) => {
            NormalizedError::new(ErrorKind::NetworkError, NETWORK_ERROR_MESSAGE)
        }
    }
}
