//! Order status API client.
//!
//! Looks up one order at a time by sales, web or purchase order number and
//! returns the raw response document. Normalization happens in
//! [`crate::parser`].
//!
//! # Architecture
//!
//! - OAuth2 client credentials grant: client key/secret → bearer token → API
//! - Tokens cached in memory and refreshed when expired
//! - A rejected token (`401`) triggers one re-authentication and one retry
//!
//! # Example
//!
//! ```rust,ignore
//! use order_tracker::order_api::OrderApiClient;
//!
//! let client = OrderApiClient::new(&api_config)?;
//! client.authenticate().await?;
//!
//! let number = OrderNumber::parse("98765432")?;
//! if let Some(raw) = client.fetch_order(&number, OrderNumberKind::SalesOrder).await? {
//!     let order = order_tracker::parser::normalize(&raw);
//! }
//! ```

pub mod auth;
pub mod client;

pub use client::OrderApiClient;

use thiserror::Error;

/// Errors that can occur when interacting with the order API.
///
/// Everything except [`OrderApiError::MalformedResponse`] is a request
/// failure: the order could not be fetched at all.
#[derive(Debug, Error)]
pub enum OrderApiError {
    /// HTTP request failed (connection, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Response status.
        status: reqwest::StatusCode,
        /// Response body (truncated).
        body: String,
    },

    /// Token request was rejected.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The API rejected a freshly obtained token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The response body is not JSON.
    #[error("Malformed response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}

impl OrderApiError {
    /// Whether the failure happened before a response document was received.
    #[must_use]
    pub const fn is_request_failure(&self) -> bool {
        !matches!(self, Self::MalformedResponse(_))
    }
}

/// Keep error bodies short enough for a log line.
fn truncate_body(body: &str) -> String {
    const MAX_BODY_CHARS: usize = 500;

    if body.chars().count() <= MAX_BODY_CHARS {
        body.to_string()
    } else {
        let truncated: String = body.chars().take(MAX_BODY_CHARS).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = OrderApiError::Status {
            status: reqwest::StatusCode::BAD_GATEWAY,
            body: "upstream down".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 502 Bad Gateway: upstream down");
        assert!(err.is_request_failure());
    }

    #[test]
    fn test_authentication_failed_error() {
        let err = OrderApiError::AuthenticationFailed("Invalid client".to_string());
        assert_eq!(err.to_string(), "Authentication failed: Invalid client");
    }

    #[test]
    fn test_malformed_response_is_not_request_failure() {
        let parse_err = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        let err = OrderApiError::from(parse_err);
        assert!(!err.is_request_failure());
        assert!(err.to_string().starts_with("Malformed response:"));
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("short"), "short");
        let long = "x".repeat(600);
        let truncated = truncate_body(&long);
        assert_eq!(truncated.len(), 503);
        assert!(truncated.ends_with("..."));
    }
}
