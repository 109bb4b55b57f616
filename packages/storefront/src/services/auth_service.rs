use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::info;

use crate::models::auth::requests::{LoginRequest, RegisterRequest};
use crate::models::auth::responses::LoginResponse;
use crate::models::http::ApiRequest;
use crate::models::user::UserProfile;
use crate::services::dispatcher::{RequestDispatcher, NETWORK_ERROR_MESSAGE};
use crate::services::errors::api_errors::ApiError;
use crate::services::errors::auth_service_errors::AuthServiceError;
use crate::services::session_service::SessionStore;
use crate::services::token_service::is_valid_token_format;

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const PROFILE_PATH: &str = "/users/me";

/// Login, registration and self-service profile calls. Successful logins are
/// committed to the dispatcher's session store.
pub struct AuthService {
    dispatcher: Arc<RequestDispatcher>,
}

impl AuthService {
    pub fn new(dispatcher: Arc<RequestDispatcher>) -> Self {
        AuthService { dispatcher }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        self.dispatcher.session()
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, AuthServiceError> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthServiceError::ValidationError(
                "Email or password cannot be empty".to_string(),
            ));
        }

        // A previous session must not leak into the new one.
        self.session().logout().await?;

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .dispatcher
            .dispatch(ApiRequest::post(LOGIN_PATH).json(json!(request)))
            .await
            .map_err(|e| {
                AuthServiceError::AuthenticationFailed(failure_message(&e, "Login failed"))
            })?;

        let body: LoginResponse = response
            .json()
            .map_err(|_| AuthServiceError::InvalidTokenFormat)?;
        let token = body.token.ok_or(AuthServiceError::InvalidTokenFormat)?;
        if !is_valid_token_format(&token) {
            return Err(AuthServiceError::InvalidTokenFormat);
        }
        let profile: UserProfile = serde_json::from_value(Value::Object(body.profile))
            .map_err(|e| {
                AuthServiceError::AuthenticationFailed(format!(
                    "Login response did not contain a usable profile: {}",
                    e
                ))
            })?;

        self.session().persist_session(&token, &profile).await?;
        info!("Logged in as {} ({})", profile.email, profile.role);
        Ok(profile)
    }

    /// Creates the account only. The caller logs in separately, even when
    /// the response happens to carry a token.
    pub async fn register(&self, request: &RegisterRequest) -> Result<Value, AuthServiceError> {
        if request.email.is_empty() || request.password.is_empty() {
            return Err(AuthServiceError::ValidationError(
                "Email or password cannot be empty".to_string(),
            ));
        }

        self.session().logout().await?;

        let response = self
            .dispatcher
            .dispatch(ApiRequest::post(REGISTER_PATH).json(json!(request)))
            .await
            .map_err(|e| {
                AuthServiceError::RegistrationFailed(failure_message(&e, "Registration failed"))
            })?;

        info!("Registered {}", request.email);
        Ok(response.json_value())
    }

    pub async fn logout(&self) -> Result<(), AuthServiceError> {
        self.session().logout().await?;
        info!("Logged out");
        Ok(())
    }

    pub async fn profile(&self) -> Result<Value, AuthServiceError> {
        let response = self.dispatcher.send(ApiRequest::get(PROFILE_PATH)).await?;
        Ok(response.json_value())
    }

    /// Updates the profile remotely, then folds the server's answer into the
    /// stored profile.
    pub async fn update_profile(
        &self,
        patch: Map<String, Value>,
    ) -> Result<Value, AuthServiceError> {
        let response = self
            .dispatcher
            .send(ApiRequest::put(PROFILE_PATH).json(Value::Object(patch)))
            .await?;

        let updated = response.json_value();
        if let Value::Object(fields) = &updated {
            self.session().merge_profile(fields).await?;
        }
        Ok(updated)
    }

    /// Deletes the caller's own account and ends the session.
    pub async fn delete_me(&self) -> Result<Value, AuthServiceError> {
        let response = self
            .dispatcher
            .send(ApiRequest::delete(PROFILE_PATH))
            .await?;
        self.session().logout().await?;
        info!("Account deleted, session cleared");
        Ok(response.json_value())
    }
}

fn failure_message(error: &ApiError, fallback: &str) -> String {
    match error {
        ApiError::Http { message, .. } => message.clone().unwrap_or_else(|| fallback.to_string()),
        ApiError::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
    }
}
