//! Order status API client.

use std::sync::Arc;

use order_tracker_core::{OrderNumber, OrderNumberKind};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use url::Url;

use super::auth::{AccessToken, request_token};
use super::{OrderApiError, truncate_body};
use crate::config::ApiConfig;

/// Business object document identifier sent with every request.
const BOD_ID: &str = "Q4FY23-CCWDeliveryUpdater";

/// Response criteria code for "order not found or not accessible".
const ORDER_NOT_FOUND_CODE: &str = "OSA001";

/// Pointer to the response criteria expression in an order status response.
const RESPONSE_EXPRESSION_POINTER: &str =
    "/ShowPurchaseOrder/value/DataArea/Show/ResponseCriteria/0/ResponseExpression/value";

/// Order status API client.
///
/// # Authentication
///
/// Uses OAuth2 client credentials. Tokens are cached in memory, renewed
/// before a request when expired, and renewed once more when the API rejects
/// them with `401`.
#[derive(Clone)]
pub struct OrderApiClient {
    inner: Arc<OrderApiClientInner>,
}

struct OrderApiClientInner {
    client: reqwest::Client,
    token_url: Url,
    order_url: Url,
    client_key: String,
    client_secret: SecretString,
    /// In-memory token cache
    token: RwLock<Option<AccessToken>>,
}

/// Result of a single authorized request.
enum Attempt {
    Done(reqwest::Response),
    Rejected(String),
}

impl OrderApiClient {
    /// Create a new client without a token.
    ///
    /// # Errors
    ///
    /// Returns `OrderApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, OrderApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(OrderApiClientInner {
                client,
                token_url: config.token_url.clone(),
                order_url: config.order_url.clone(),
                client_key: config.client_key.clone(),
                client_secret: config.client_secret.clone(),
                token: RwLock::new(None),
            }),
        })
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Obtain a fresh access token and cache it.
    ///
    /// # Errors
    ///
    /// Returns `OrderApiError::AuthenticationFailed` if the credentials are
    /// rejected, or `OrderApiError::Http` on network failures.
    #[instrument(skip(self))]
    pub async fn authenticate(&self) -> Result<(), OrderApiError> {
        let token = request_token(
            &self.inner.client,
            &self.inner.token_url,
            &self.inner.client_key,
            &self.inner.client_secret,
        )
        .await?;

        debug!(expires_at = token.expires_at, "Obtained access token");
        *self.inner.token.write().await = Some(token);
        Ok(())
    }

    /// Check if we have a valid (non-expired) token.
    pub async fn has_valid_token(&self) -> bool {
        self.inner
            .token
            .read()
            .await
            .as_ref()
            .is_some_and(|token| !token.is_expired())
    }

    /// Get the cached access token, authenticating first if it is missing or
    /// expired.
    async fn access_token(&self) -> Result<String, OrderApiError> {
        if !self.has_valid_token().await {
            self.authenticate().await?;
        }

        let token = self.inner.token.read().await;
        token
            .as_ref()
            .map(|token| token.access_token.expose_secret().to_string())
            .ok_or_else(|| OrderApiError::AuthenticationFailed("No access token".to_string()))
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Fetch the status document for one order.
    ///
    /// Returns `Ok(None)` when the API reports that the order does not exist
    /// or is not accessible with these credentials.
    ///
    /// # Errors
    ///
    /// Returns `OrderApiError::Unauthorized` if a freshly obtained token is
    /// also rejected, `OrderApiError::Status` on other non-success statuses,
    /// `OrderApiError::Http` on network failures and timeouts, and
    /// `OrderApiError::MalformedResponse` if the body is not JSON.
    #[instrument(skip(self), fields(order = %number, kind = %kind))]
    pub async fn fetch_order(
        &self,
        number: &OrderNumber,
        kind: OrderNumberKind,
    ) -> Result<Option<Value>, OrderApiError> {
        let body = build_request_body(number, kind, &chrono::Utc::now().to_rfc3339());

        let response = match self.send(&body).await? {
            Attempt::Done(response) => response,
            Attempt::Rejected(reason) => {
                warn!(%reason, "Access token rejected, re-authenticating");
                self.authenticate().await?;
                match self.send(&body).await? {
                    Attempt::Done(response) => response,
                    Attempt::Rejected(reason) => return Err(OrderApiError::Unauthorized(reason)),
                }
            }
        };

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(OrderApiError::Status {
                status,
                body: truncate_body(&text),
            });
        }

        let document: Value = serde_json::from_str(&text)?;

        if is_order_not_found(&document) {
            debug!("Order not found or not accessible");
            return Ok(None);
        }

        Ok(Some(document))
    }

    /// Send one authorized request. A `401` is reported as
    /// [`Attempt::Rejected`] so the caller can decide whether to retry.
    async fn send(&self, body: &Value) -> Result<Attempt, OrderApiError> {
        let access_token = self.access_token().await?;

        let response = self
            .inner
            .client
            .post(self.inner.order_url.clone())
            .header("Authorization", format!("Bearer {access_token}"))
            .header("Accept", "application/json")
            .header("Cache-Control", "no-cache")
            .json(body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            *self.inner.token.write().await = None;
            let text = response.text().await.unwrap_or_default();
            return Ok(Attempt::Rejected(truncate_body(&text)));
        }

        Ok(Attempt::Done(response))
    }
}

/// Build the order status request for one order number.
///
/// Sales and web order numbers that are all digits are sent as JSON numbers;
/// purchase order numbers are always strings.
#[must_use]
pub fn build_request_body(number: &OrderNumber, kind: OrderNumberKind, created_at: &str) -> Value {
    let id = match (kind, number.as_u64()) {
        (OrderNumberKind::SalesOrder | OrderNumberKind::WebOrder, Some(n)) => json!(n),
        _ => json!(number.as_str()),
    };

    let mut header = json!({
        "Description": [{ "value": true, "typeCode": "details" }],
    });

    let reference = match kind {
        OrderNumberKind::SalesOrder => ("SalesOrderReference", json!([{ "ID": { "value": id } }])),
        OrderNumberKind::WebOrder => ("DocumentReference", json!([{ "ID": { "value": id } }])),
        OrderNumberKind::PurchaseOrder => ("ID", json!({ "value": id })),
    };

    if let Some(map) = header.as_object_mut() {
        map.insert(reference.0.to_string(), reference.1);
    }

    json!({
        "GetPurchaseOrder": {
            "value": {
                "DataArea": {
                    "PurchaseOrder": [{ "PurchaseOrderHeader": header }]
                },
                "ApplicationArea": {
                    "CreationDateTime": created_at,
                    "BODID": { "value": BOD_ID, "schemeVersionID": "V1" }
                }
            }
        }
    })
}

/// Whether the response reports the order as not found or not accessible.
#[must_use]
pub fn is_order_not_found(document: &Value) -> bool {
    document
        .pointer(RESPONSE_EXPRESSION_POINTER)
        .and_then(Value::as_str)
        .is_some_and(|expression| expression.contains(ORDER_NOT_FOUND_CODE))
}
