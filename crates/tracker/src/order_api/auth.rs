//! Order API authentication.
//!
//! Exchanges the client key and secret for a bearer token using the OAuth2
//! client credentials grant.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use super::{OrderApiError, truncate_body};

/// Token lifetime assumed when the token endpoint does not report one.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Bearer token for order API requests.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// Token sent in the `Authorization` header.
    pub access_token: SecretString,
    /// Unix timestamp when the token expires.
    pub expires_at: i64,
}

/// Response from the token endpoint.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Token lifetime in seconds.
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Error response from the token endpoint.
#[derive(Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Request a new access token.
///
/// # Arguments
///
/// * `token_url` - OAuth token endpoint
/// * `client_key` - OAuth client ID
/// * `client_secret` - OAuth client secret
///
/// # Errors
///
/// Returns `OrderApiError::AuthenticationFailed` if the endpoint rejects the
/// credentials, or `OrderApiError::Http` on network failures.
#[instrument(skip(client, client_secret), fields(client_key = %client_key))]
pub async fn request_token(
    client: &reqwest::Client,
    token_url: &Url,
    client_key: &str,
    client_secret: &SecretString,
) -> Result<AccessToken, OrderApiError> {
    let now = chrono::Utc::now().timestamp();

    let response = client
        .post(token_url.clone())
        .header("Accept", "application/json")
        .header("Cache-Control", "no-cache")
        .form(&[
            ("client_id", client_key),
            ("client_secret", client_secret.expose_secret()),
            ("grant_type", "client_credentials"),
        ])
        .send()
        .await?;

    let status = response.status();

    if status.is_success() {
        let token_response: TokenResponse = response.json().await?;

        Ok(AccessToken {
            access_token: SecretString::from(token_response.access_token),
            expires_at: expiry(now, token_response.expires_in),
        })
    } else if status == reqwest::StatusCode::UNAUTHORIZED
        || status == reqwest::StatusCode::BAD_REQUEST
        || status == reqwest::StatusCode::FORBIDDEN
    {
        let error_response: TokenErrorResponse =
            response.json().await.unwrap_or(TokenErrorResponse {
                error: None,
                error_description: None,
            });

        let message = error_response
            .error_description
            .or(error_response.error)
            .unwrap_or_else(|| "Invalid client credentials".to_string());

        Err(OrderApiError::AuthenticationFailed(message))
    } else {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        Err(OrderApiError::AuthenticationFailed(format!(
            "HTTP {status}: {}",
            truncate_body(&error_text)
        )))
    }
}

/// Expiry timestamp for a token issued at `now`, clamped to the `i64` range.
const fn expiry(now: i64, expires_in: Option<i64>) -> i64 {
    let secs = match expires_in {
        Some(secs) => secs,
        None => DEFAULT_EXPIRES_IN_SECS,
    };
    now.saturating_add(secs)
}

impl AccessToken {
    /// Check if the token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        // Consider expired if less than 60 seconds remaining
        now >= self.expires_at.saturating_sub(60)
    }
}
