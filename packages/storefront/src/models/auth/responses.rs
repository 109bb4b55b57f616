use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of a successful `/auth/login`: the token next to the profile fields.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: Option<String>,
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

/// Claims read from the middle segment of a bearer token. Decoded without
/// signature verification; the client only needs expiry and diagnostics.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<String>, // subject assigned by the issuer
    pub exp: f64,            // expiration time, seconds since epoch (may be fractional)
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub role: Option<Value>,
    #[serde(default)]
    pub authorities: Option<Value>,
}

impl TokenClaims {
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp <= now as f64
    }
}
