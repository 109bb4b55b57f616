//! Shared fixtures: a wiremock backend, minted tokens and a client wired to both.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use storefront::models::user::{Role, UserId, UserProfile};
use storefront::repositories::session_repository::InMemorySessionRepository;
use storefront::services::dispatcher::{Navigator, ReqwestTransport};
use storefront::services::session_service::{PROFILE_KEY, TOKEN_KEY};
use storefront::{ClientConfig, StorefrontClient};
use wiremock::MockServer;

pub const LANDING_PATH: &str = "/login";

/// Remembers every forced redirect.
#[derive(Default)]
pub struct RecordingNavigator {
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect_to(&self, path: &str) {
        self.redirects.lock().unwrap().push(path.to_string());
    }
}

pub struct TestClient {
    pub client: StorefrontClient,
    pub repository: Arc<InMemorySessionRepository>,
    pub navigator: Arc<RecordingNavigator>,
}

pub fn token_expiring_in(offset: Duration) -> String {
    let exp = (Utc::now() + offset).timestamp();
    encode(
        &Header::default(),
        &json!({ "sub": "user-1", "exp": exp, "role": "CUSTOMER" }),
        &EncodingKey::from_secret("integration-test-secret".as_ref()),
    )
    .unwrap()
}

pub fn valid_token() -> String {
    token_expiring_in(Duration::hours(1))
}

pub fn expired_token() -> String {
    token_expiring_in(-Duration::hours(1))
}

pub fn profile(role: Role) -> UserProfile {
    let mut profile = UserProfile::new(
        "Integration".to_string(),
        "Tester".to_string(),
        "tester@example.com".to_string(),
        role,
    );
    profile.id = Some(UserId::Number(42));
    profile
}

pub fn login_body(token: &str, role: Role) -> Value {
    json!({
        "token": token,
        "userID": 42,
        "firstName": "Integration",
        "lastName": "Tester",
        "email": "tester@example.com",
        "role": role.as_str()
    })
}

pub fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::development().with_base_url(server.uri())
}

/// Client against `server` with an empty session.
pub async fn client_for(server: &MockServer) -> TestClient {
    client_with_entries(&config_for(server), Vec::new()).await
}

/// Client against `server` with `token` and a profile already stored.
pub async fn signed_in_client(server: &MockServer, token: &str, role: Role) -> TestClient {
    let entries = vec![
        (TOKEN_KEY.to_string(), token.to_string()),
        (
            PROFILE_KEY.to_string(),
            serde_json::to_string(&profile(role)).unwrap(),
        ),
    ];
    client_with_entries(&config_for(server), entries).await
}

pub async fn client_with_entries(
    config: &ClientConfig,
    entries: Vec<(String, String)>,
) -> TestClient {
    let config = ClientConfig {
        landing_path: LANDING_PATH.to_string(),
        ..config.clone()
    };
    let repository = Arc::new(InMemorySessionRepository::with_entries(entries));
    let navigator = Arc::new(RecordingNavigator::default());
    let transport = Arc::new(ReqwestTransport::new(&config).unwrap());
    let client =
        StorefrontClient::from_parts(&config, transport, repository.clone(), navigator.clone())
            .await;
    TestClient {
        client,
        repository,
        navigator,
    }
}

/// Authorization headers of every request the server saw, in order.
pub async fn authorization_headers(server: &MockServer) -> Vec<Option<String>> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| {
            request
                .headers
                .get("authorization")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        })
        .collect()
}
