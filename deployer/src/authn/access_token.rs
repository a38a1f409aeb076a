//! ARM bearer token handling

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::errors::DeployError;

/// Claims carried by an ARM access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Expiration timestamp
    pub exp: i64,

    /// Tenant ID
    #[serde(default)]
    pub tid: Option<String>,

    /// Signed-in principal, when present
    #[serde(default)]
    pub upn: Option<String>,

    #[serde(default)]
    pub name: Option<String>,
}

/// An access token for the management plane
///
/// The raw token lives in a `SecretString` and is exposed only when a
/// request header is built. Never persisted.
#[derive(Debug, Clone)]
pub struct AccessToken {
    raw: SecretString,
    pub claims: TokenClaims,
}

impl AccessToken {
    /// Decode a raw JWT into a token wrapper.
    /// Note: This does NOT validate the signature, only decodes the
    /// claims; the management plane validates the token on every call.
    pub fn from_raw(raw: String) -> Result<Self, DeployError> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;

        let token_data = decode::<TokenClaims>(&raw, &DecodingKey::from_secret(b""), &validation)
            .map_err(|e| DeployError::TokenError(format!("Failed to decode token: {}", e)))?;

        Ok(Self {
            raw: SecretString::from(raw),
            claims: token_data.claims,
        })
    }

    /// The raw bearer token for an Authorization header
    pub fn bearer(&self) -> &str {
        self.raw.expose_secret()
    }

    /// The tenant the token was issued for
    pub fn tenant_id(&self) -> Option<&str> {
        self.claims.tid.as_deref()
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp();
        self.claims.exp < now
    }

    /// Check if the token expires within the given duration
    pub fn expires_within(&self, seconds: i64) -> bool {
        let now = Utc::now().timestamp();
        self.claims.exp < now + seconds
    }

    /// Get expiration time
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.claims.exp, 0).unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    fn fake_jwt(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::json!({ "exp": exp, "tid": "tenant-1" }).to_string(),
        );
        let signature = URL_SAFE_NO_PAD.encode(b"sig");
        format!("{}.{}.{}", header, payload, signature)
    }

    #[test]
    fn test_decode_and_expiry() {
        let future = Utc::now().timestamp() + 3600;
        let token = AccessToken::from_raw(fake_jwt(future)).unwrap();
        assert!(!token.is_expired());
        assert!(token.expires_within(7200));
        assert_eq!(token.tenant_id(), Some("tenant-1"));

        let stale = AccessToken::from_raw(fake_jwt(Utc::now().timestamp() - 60)).unwrap();
        assert!(stale.is_expired());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(AccessToken::from_raw("not-a-jwt".to_string()).is_err());
    }
}
