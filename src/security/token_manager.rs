//! OAuth2 access tokens for the Android Publisher API
//!
//! Implements the service account flow: an RS256-signed JWT assertion is
//! exchanged at the key's token endpoint for a short-lived bearer token.
//! Tokens are kept in `secrecy` wrappers and only ever logged masked.

use crate::core::error::PublishError;
use crate::security::credentials::ServiceAccountKey;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// OAuth2 scope granting access to the Play publishing API
pub const ANDROID_PUBLISHER_SCOPE: &str = "https://www.googleapis.com/auth/androidpublisher";

const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Maximum assertion lifetime accepted by Google
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Claims of the JWT assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Bearer token returned by the token endpoint
pub struct AccessToken {
    pub token: SecretString,
    pub expires_at: DateTime<Utc>,
}

/// Obtains access tokens for a service account
///
/// # Examples
///
/// ```
/// use play_publisher::security::AccessTokenManager;
///
/// assert_eq!(AccessTokenManager::mask_token("ya29.a0AfH6SMBx"), "ya2...MBx");
/// assert_eq!(AccessTokenManager::mask_token("short"), "****");
/// ```
pub struct AccessTokenManager {
    http: reqwest::Client,
}

impl AccessTokenManager {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Claims for an assertion issued at `now`
    pub fn build_claims(key: &ServiceAccountKey, now: DateTime<Utc>) -> AssertionClaims {
        let iat = now.timestamp();
        AssertionClaims {
            iss: key.client_email.clone(),
            scope: ANDROID_PUBLISHER_SCOPE.to_string(),
            aud: key.token_uri().to_string(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        }
    }

    /// Sign the assertion with the key's RSA private key
    pub fn sign_assertion(
        key: &ServiceAccountKey,
        now: DateTime<Utc>,
    ) -> Result<String, PublishError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.expose_secret().as_bytes())
            .map_err(|e| PublishError::CredentialsInvalid {
                message: format!("private_key を読み込めません: {}", e),
            })?;

        let mut header = Header::new(Algorithm::RS256);
        header.kid = key.private_key_id.clone();

        jsonwebtoken::encode(&header, &Self::build_claims(key, now), &encoding_key).map_err(|e| {
            PublishError::CredentialsInvalid {
                message: format!("JWTの署名に失敗しました: {}", e),
            }
        })
    }

    /// Exchange a signed assertion for an access token
    pub async fn fetch_token(&self, key: &ServiceAccountKey) -> Result<AccessToken, PublishError> {
        let now = Utc::now();
        let assertion = Self::sign_assertion(key, now)?;

        debug!(token_uri = key.token_uri(), client_email = %key.client_email, "requesting access token");

        let response = self
            .http
            .post(key.token_uri())
            .form(&[("grant_type", JWT_BEARER_GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| PublishError::NetworkError {
                operation: "oauth2.token".to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| PublishError::NetworkError {
            operation: "oauth2.token".to_string(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            let parsed: TokenErrorResponse = serde_json::from_str(&body).unwrap_or_default();
            let message = parsed
                .error_description
                .or(parsed.error)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(PublishError::AuthenticationFailed { message });
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| PublishError::AuthenticationFailed {
                message: format!("トークン応答を解析できません: {}", e),
            })?;

        let lifetime = parsed.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
        debug!(token = %Self::mask_token(&parsed.access_token), expires_in = lifetime, "access token obtained");

        Ok(AccessToken {
            token: SecretString::new(parsed.access_token.into()),
            expires_at: now + Duration::seconds(lifetime),
        })
    }

    /// Masks a token for safe logging
    ///
    /// Shows only the first 3 and last 3 characters for identification purposes.
    /// Tokens shorter than 10 characters are fully masked as "****".
    pub fn mask_token(token: &str) -> String {
        if token.len() < 10 || !token.is_ascii() {
            return "****".to_string();
        }

        let prefix = &token[..3];
        let suffix = &token[token.len() - 3..];
        format!("{}...{}", prefix, suffix)
    }
}
