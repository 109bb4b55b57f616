use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::collections::HashSet;

use crate::models::auth::responses::TokenClaims;

/// A bearer token has exactly three dot-separated segments.
pub fn is_valid_token_format(token: &str) -> bool {
    !token.is_empty() && token.split('.').count() == 3
}

/// Reads the claims segment without checking the signature. The client holds
/// no key; the server stays the authority on whether a token is genuine.
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    if !is_valid_token_format(token) {
        return None;
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    // `exp` is required by `TokenClaims` itself; the library's own check
    // rejects fractional values.
    validation.required_spec_claims = HashSet::new();

    decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| tracing::debug!("Token claims could not be decoded: {}", e))
        .ok()
}

/// A token whose claims cannot be read counts as expired.
pub fn is_token_expired(token: &str) -> bool {
    is_token_expired_at(token, Utc::now().timestamp())
}

pub fn is_token_expired_at(token: &str, now: i64) -> bool {
    decode_claims(token).map_or(true, |claims| claims.is_expired_at(now))
}

/// Format and expiry together: the token may be sent.
pub fn is_token_usable(token: &str) -> bool {
    is_valid_token_format(token) && !is_token_expired(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use proptest::prelude::*;
    use serde_json::json;
    use test_case::test_case;

    fn token_with(claims: serde_json::Value) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("server-side-secret".as_ref()),
        )
        .unwrap()
    }

    #[test_case("a.b.c", true ; "three segments")]
    #[test_case("a.b", false ; "two segments")]
    #[test_case("a.b.c.d", false ; "four segments")]
    #[test_case("", false ; "empty")]
    #[test_case("undefined", false ; "placeholder")]
    fn test_token_format(token: &str, expected: bool) {
        assert_eq!(is_valid_token_format(token), expected);
    }

    #[test]
    fn test_decode_claims_ignores_signature() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let token = token_with(json!({ "sub": "user-1", "exp": exp, "role": "ADMIN" }));

        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("user-1"));
        assert_eq!(claims.exp, exp as f64);
        assert_eq!(claims.role, Some(json!("ADMIN")));
    }

    #[test]
    fn test_future_token_is_usable() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let token = token_with(json!({ "sub": "user-1", "exp": exp }));
        assert!(!is_token_expired(&token));
        assert!(is_token_usable(&token));
    }

    #[test]
    fn test_past_token_is_expired() {
        let exp = (Utc::now() - Duration::minutes(5)).timestamp();
        let token = token_with(json!({ "sub": "user-1", "exp": exp }));
        assert!(is_token_expired(&token));
        assert!(!is_token_usable(&token));
    }

    #[test]
    fn test_fractional_exp_is_usable() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp() as f64 + 0.5;
        let token = token_with(json!({ "sub": "user-1", "exp": exp }));
        assert!(is_token_usable(&token));
    }

    #[test]
    fn test_token_without_exp_is_expired() {
        let token = token_with(json!({ "sub": "user-1" }));
        assert!(decode_claims(&token).is_none());
        assert!(is_token_expired(&token));
    }

    #[test]
    fn test_garbage_segments_are_expired() {
        assert!(is_token_expired("header.payload.signature"));
    }

    proptest! {
        #[test]
        fn prop_segment_count_decides_format(
            segments in proptest::collection::vec("[A-Za-z0-9_-]{0,8}", 1..7)
        ) {
            let token = segments.join(".");
            prop_assert_eq!(is_valid_token_format(&token), segments.len() == 3);
        }
    }
}
