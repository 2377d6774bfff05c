//! Access token issuing and verification.
//!
//! Tokens are compact two-part strings: `base64(claims JSON).base64(HMAC-SHA256 signature)`. The
//! signing key comes from the server configuration. Verification checks the signature before
//! anything else; claims are only deserialized from a payload that authenticated.

use base64::{decode_config, encode_config, URL_SAFE_NO_PAD};
use bistro_engine::db_types::{Role, User};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::{config::AuthConfig, errors::AuthError};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub user_id: i64,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl AccessClaims {
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }
}

#[derive(Clone)]
pub struct TokenIssuer {
    config: AuthConfig,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { config: config.clone() }
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(self.config.hmac_key.reveal().as_bytes())
            .map_err(|e| AuthError::ValidationError(format!("The signing key was rejected: {e}")))
    }

    fn signature(&self, payload: &str) -> Result<Vec<u8>, AuthError> {
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }

    /// Issue a new access token for the given user. The caller must already have verified the
    /// user's login credential.
    pub fn issue_token(&self, user: &User, validity: Option<Duration>) -> Result<String, AuthError> {
        let validity = validity.unwrap_or(self.config.token_validity);
        let claims = AccessClaims { user_id: user.id, role: user.role, expires_at: Utc::now() + validity };
        let json = serde_json::to_string(&claims)
            .map_err(|e| AuthError::ValidationError(format!("Could not serialize claims: {e}")))?;
        let payload = encode_config(json, URL_SAFE_NO_PAD);
        let signature = encode_config(self.signature(&payload)?, URL_SAFE_NO_PAD);
        Ok(format!("{payload}.{signature}"))
    }

    /// Verify the signature and expiry of an access token and return its claims.
    pub fn decode_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let (payload, signature) = token
            .split_once('.')
            .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected two dot-separated parts".to_string()))?;
        let given = decode_config(signature, URL_SAFE_NO_PAD)
            .map_err(|e| AuthError::PoorlyFormattedToken(format!("Signature is not valid base64: {e}")))?;
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&given).map_err(|e| AuthError::ValidationError(e.to_string()))?;
        let json = decode_config(payload, URL_SAFE_NO_PAD)
            .map_err(|e| AuthError::PoorlyFormattedToken(format!("Payload is not valid base64: {e}")))?;
        let claims: AccessClaims = serde_json::from_slice(&json)
            .map_err(|e| AuthError::PoorlyFormattedToken(format!("Claims are not valid JSON: {e}")))?;
        if claims.expires_at < Utc::now() {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }
}

/// Pull the bearer token out of the `Authorization` header, or fall back to the
/// `bistro_access_token` header and the `token` query parameter (the latter exists for
/// EventSource clients, which cannot set headers).
pub fn extract_token(req: &actix_web::HttpRequest) -> Option<String> {
    if let Some(value) = req.headers().get("Authorization").and_then(|v| v.to_str().ok()) {
        if let Some(token) = value.strip_prefix("Bearer ") {
            return Some(token.trim().to_string());
        }
    }
    if let Some(value) = req.headers().get("bistro_access_token").and_then(|v| v.to_str().ok()) {
        return Some(value.trim().to_string());
    }
    let query = req.query_string();
    for pair in query.split('&') {
        if let Some(token) = pair.strip_prefix("token=") {
            return Some(token.to_string());
        }
    }
    None
}

impl actix_web::FromRequest for AccessClaims {
    type Error = crate::errors::ServerError;
    type Future = futures::future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _payload: &mut actix_http::Payload) -> Self::Future {
        use actix_web::HttpMessage;
        let claims = req.extensions().get::<AccessClaims>().cloned();
        futures::future::ready(claims.ok_or(crate::errors::ServerError::CouldNotDeserializeAuthToken))
    }
}

#[cfg(test)]
mod test {
    use bistro_engine::db_types::User;
    use chrono::Utc;

    use super::*;

    fn config() -> AuthConfig {
        AuthConfig {
            hmac_key: bistro_common::Secret::new("test-signing-key-which-is-long-enough!!!".to_string()),
            token_validity: Duration::hours(1),
        }
    }

    fn user(id: i64, role: Role) -> User {
        User { id, display_name: format!("user-{id}"), role, created_at: Utc::now() }
    }

    #[test]
    fn tokens_round_trip() {
        let issuer = TokenIssuer::new(&config());
        let token = issuer.issue_token(&user(42, Role::Staff), None).unwrap();
        let claims = issuer.decode_token(&token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert!(claims.is_staff());
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let issuer = TokenIssuer::new(&config());
        let token = issuer.issue_token(&user(42, Role::Customer), None).unwrap();
        let (payload, signature) = token.split_once('.').unwrap();
        // Re-sign a forged payload with a different key.
        let other = TokenIssuer::new(&AuthConfig {
            hmac_key: bistro_common::Secret::new("another-key-that-is-also-long-enough!!!!".to_string()),
            token_validity: Duration::hours(1),
        });
        let forged = other.issue_token(&user(42, Role::Staff), None).unwrap();
        assert!(issuer.decode_token(&forged).is_err());
        // Mix and match parts.
        let (_, forged_sig) = forged.split_once('.').unwrap();
        assert!(issuer.decode_token(&format!("{payload}.{forged_sig}")).is_err());
        assert!(issuer.decode_token(&format!("{payload}{signature}")).is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let issuer = TokenIssuer::new(&config());
        let token = issuer.issue_token(&user(1, Role::Customer), Some(Duration::seconds(-5))).unwrap();
        assert!(matches!(issuer.decode_token(&token), Err(AuthError::TokenExpired)));
    }
}
