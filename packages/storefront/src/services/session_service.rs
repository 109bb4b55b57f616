use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::user::{Role, UserProfile};
use crate::repositories::errors::session_repository_errors::SessionRepositoryError;
use crate::repositories::session_repository::SessionRepository;
use crate::services::errors::auth_service_errors::AuthServiceError;
use crate::services::token_service::{is_token_expired, is_valid_token_format};

pub const TOKEN_KEY: &str = "authToken";
pub const PROFILE_KEY: &str = "userInfo";

/// Key names used by earlier client versions for the token and the profile.
pub const LEGACY_TOKEN_KEYS: [&str; 4] = ["token", "jwt_token", "access_token", "bearer_token"];
pub const LEGACY_PROFILE_KEYS: [&str; 3] = ["user", "userData", "currentUser"];

// Anything shorter cannot be a real token.
const MIN_TOKEN_LENGTH: usize = 10;

/// Who is logged in. Token and profile are only ever written and cleared as a
/// pair; any read that finds a malformed or expired token evicts both.
pub struct SessionStore {
    repository: Arc<dyn SessionRepository>,
}

impl SessionStore {
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        SessionStore { repository }
    }

    /// Builds the store and clears state left behind by older schema versions.
    pub async fn init(repository: Arc<dyn SessionRepository>) -> Self {
        let store = SessionStore::new(repository);
        if let Err(e) = store.sweep_legacy_keys().await {
            warn!("Session storage sweep failed: {}", e);
        }
        store
    }

    pub async fn sweep_legacy_keys(&self) -> Result<(), SessionRepositoryError> {
        for key in std::iter::once(TOKEN_KEY).chain(LEGACY_TOKEN_KEYS) {
            if let Some(value) = self.repository.get(key).await? {
                if is_placeholder(&value) || value.len() < MIN_TOKEN_LENGTH || key != TOKEN_KEY {
                    debug!("Removing stale token entry '{}'", key);
                    self.repository.remove(key).await?;
                }
            }
        }

        for key in std::iter::once(PROFILE_KEY).chain(LEGACY_PROFILE_KEYS) {
            if let Some(value) = self.repository.get(key).await? {
                let parses = serde_json::from_str::<Value>(&value).is_ok();
                if is_placeholder(&value) || !parses || key != PROFILE_KEY {
                    debug!("Removing stale profile entry '{}'", key);
                    self.repository.remove(key).await?;
                }
            }
        }

        let has_token = self.repository.get(TOKEN_KEY).await?.is_some();
        let has_profile = self.repository.get(PROFILE_KEY).await?.is_some();
        if has_token != has_profile {
            info!("Dropping half of a session found in storage");
            self.repository.remove(TOKEN_KEY).await?;
            self.repository.remove(PROFILE_KEY).await?;
        }
        Ok(())
    }

    /// The stored token if it is well formed and unexpired. Any other stored
    /// value evicts the session.
    pub async fn token(&self) -> Option<String> {
        let token = self.stored_token().await?;

        if !is_valid_token_format(&token) {
            warn!("Stored token is malformed, clearing session");
            self.evict().await;
            return None;
        }
        if is_token_expired(&token) {
            info!("Stored token has expired, clearing session");
            self.evict().await;
            return None;
        }
        Some(token)
    }

    /// Raw stored token, without format or expiry checks.
    pub async fn stored_token(&self) -> Option<String> {
        match self.repository.get(TOKEN_KEY).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!("Failed to read token from session storage: {}", e);
                None
            }
        }
    }

    pub async fn user_profile(&self) -> Option<UserProfile> {
        let raw = match self.repository.get(PROFILE_KEY).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read profile from session storage: {}", e);
                return None;
            }
        };
        serde_json::from_str(&raw)
            .map_err(|e| warn!("Stored profile is unreadable: {}", e))
            .ok()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token().await.is_some()
    }

    pub async fn has_role(&self, role: Role) -> bool {
        self.user_profile()
            .await
            .map_or(false, |profile| profile.role == role)
    }

    pub async fn is_admin(&self) -> bool {
        self.has_role(Role::Admin).await
    }

    pub async fn is_customer(&self) -> bool {
        self.has_role(Role::Customer).await
    }

    /// Writes token and profile as one unit. A malformed token writes nothing;
    /// a failed profile write takes the token back out.
    pub async fn persist_session(
        &self,
        token: &str,
        profile: &UserProfile,
    ) -> Result<(), AuthServiceError> {
        if !is_valid_token_format(token) {
            return Err(AuthServiceError::InvalidTokenFormat);
        }
        let serialized = serde_json::to_string(profile)
            .map_err(|e| AuthServiceError::Storage(SessionRepositoryError::from(e)))?;

        self.repository.set(TOKEN_KEY, token).await?;
        if let Err(e) = self.repository.set(PROFILE_KEY, &serialized).await {
            if let Err(rollback) = self.repository.remove(TOKEN_KEY).await {
                warn!("Failed to roll back token after profile write error: {}", rollback);
            }
            return Err(e.into());
        }
        info!("Session stored for {}", profile.email);
        Ok(())
    }

    /// Shallow-merges `patch` into the stored profile. Does nothing when no
    /// profile is stored.
    pub async fn merge_profile(
        &self,
        patch: &Map<String, Value>,
    ) -> Result<Option<UserProfile>, AuthServiceError> {
        let Some(current) = self.user_profile().await else {
            return Ok(None);
        };
        let mut merged = match serde_json::to_value(&current) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        for (key, value) in patch {
            merged.insert(key.clone(), value.clone());
        }

        let profile: UserProfile = serde_json::from_value(Value::Object(merged))
            .map_err(|e| AuthServiceError::Storage(SessionRepositoryError::from(e)))?;
        let serialized = serde_json::to_string(&profile)
            .map_err(|e| AuthServiceError::Storage(SessionRepositoryError::from(e)))?;
        self.repository.set(PROFILE_KEY, &serialized).await?;
        Ok(Some(profile))
    }

    /// Removes the session and every legacy key. Keeps going past individual
    /// failures and reports the first one.
    pub async fn logout(&self) -> Result<(), SessionRepositoryError> {
        let mut first_error = None;
        let keys = [TOKEN_KEY, PROFILE_KEY]
            .into_iter()
            .chain(LEGACY_TOKEN_KEYS)
            .chain(LEGACY_PROFILE_KEYS);
        for key in keys {
            if let Err(e) = self.repository.remove(key).await {
                warn!("Failed to remove '{}' from session storage: {}", key, e);
                first_error.get_or_insert(e);
            }
        }
        debug!("Session cleared");
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn evict(&self) {
        if let Err(e) = self.logout().await {
            warn!("Session eviction incomplete: {}", e);
        }
    }
}

fn is_placeholder(value: &str) -> bool {
    value == "undefined" || value == "null"
}
