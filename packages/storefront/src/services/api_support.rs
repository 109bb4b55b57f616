use tracing::debug;

use crate::models::http::{ApiRequest, ApiResponse};
use crate::services::dispatcher::RequestDispatcher;
use crate::services::errors::api_service_errors::ApiServiceError;

/// Endpoint-specific wording for one failure status.
#[derive(Debug, Clone, Copy)]
pub enum Wording {
    /// Always this message.
    Fixed(&'static str),
    /// The server's message if any, else the default.
    Remote(&'static str),
    /// `Validation Error: ` followed by the server's message or the default.
    Validation(&'static str),
}

impl Wording {
    pub fn render(&self, remote: Option<&str>) -> String {
        match self {
            Wording::Fixed(message) => message.to_string(),
            Wording::Remote(default) => remote.unwrap_or(default).to_string(),
            Wording::Validation(default) => {
                format!("Validation Error: {}", remote.unwrap_or(default))
            }
        }
    }
}

pub type StatusOverrides = [(u16, Wording)];

/// Dispatches and normalizes failures the generic way.
pub async fn send(
    dispatcher: &RequestDispatcher,
    request: ApiRequest,
) -> Result<ApiResponse, ApiServiceError> {
    Ok(dispatcher.send(request).await?)
}

/// Dispatches, rewording the listed statuses; anything else is normalized.
pub async fn send_with(
    dispatcher: &RequestDispatcher,
    request: ApiRequest,
    overrides: &StatusOverrides,
) -> Result<ApiResponse, ApiServiceError> {
    let error = match dispatcher.dispatch(request).await {
        Ok(response) => return Ok(response),
        Err(error) => error,
    };

    if let Some(status) = error.status() {
        if let Some((_, wording)) = overrides.iter().find(|(code, _)| *code == status.as_u16()) {
            debug!("Rewording HTTP {} for this endpoint", status);
            return Err(ApiServiceError::rejected(
                Some(status),
                wording.render(error.remote_message()),
            ));
        }
    }
    Err(dispatcher.handle_api_error(&error).await.into())
}
