use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::billing_provider::{
        BillingProvider, CheckoutRequest, CheckoutSession, CustomerId, PortalSession,
    },
    domain::entities::billing_event::SubscriptionSnapshot,
};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: SecretString,
}

impl StripeClient {
    pub fn new(client: Client, secret_key: SecretString) -> Self {
        Self { client, secret_key }
    }

    fn auth_header(&self) -> String {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:", self.secret_key.expose_secret()));
        format!("Basic {}", encoded)
    }

    async fn post_form<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> AppResult<T> {
        let response = self
            .client
            .post(format!("{}/{}", STRIPE_API_BASE, path))
            .header("Authorization", self.auth_header())
            .form(params)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Stripe request failed: {}", e)))?;

        self.handle_response(response).await
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Stripe API error");
            return Err(api_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(body = %body, error = %e, "Failed to parse Stripe response");
            AppError::Internal(format!("Failed to parse Stripe response: {}", e))
        })
    }
}

#[async_trait]
impl BillingProvider for StripeClient {
    async fn create_customer(&self, email: &str, user_id: Uuid) -> AppResult<CustomerId> {
        let params = [
            ("email", email.to_string()),
            ("metadata[user_id]", user_id.to_string()),
        ];
        let customer: StripeCustomer = self.post_form("customers", &params).await?;
        Ok(CustomerId::new(customer.id))
    }

    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> AppResult<CheckoutSession> {
        let user_id = request.client_reference_id.to_string();
        let params = [
            ("customer", request.customer_id.as_str().to_string()),
            ("client_reference_id", user_id.clone()),
            ("mode", "subscription".to_string()),
            ("payment_method_types[0]", "card".to_string()),
            ("line_items[0][price]", request.price_id),
            ("line_items[0][quantity]", "1".to_string()),
            ("success_url", request.success_url),
            ("cancel_url", request.cancel_url),
            ("allow_promotion_codes", "true".to_string()),
            ("billing_address_collection", "auto".to_string()),
            ("subscription_data[metadata][user_id]", user_id),
        ];
        let session: StripeCheckoutSession = self.post_form("checkout/sessions", &params).await?;
        Ok(CheckoutSession {
            session_id: session.id,
            url: session.url,
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &CustomerId,
        return_url: &str,
    ) -> AppResult<PortalSession> {
        let params = [
            ("customer", customer_id.as_str().to_string()),
            ("return_url", return_url.to_string()),
        ];
        let session: StripePortalSession =
            self.post_form("billing_portal/sessions", &params).await?;
        Ok(PortalSession { url: session.url })
    }

    async fn get_subscription(&self, subscription_id: &str) -> AppResult<SubscriptionSnapshot> {
        let response = self
            .client
            .get(format!("{}/subscriptions/{}", STRIPE_API_BASE, subscription_id))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Stripe request failed: {}", e)))?;

        let object: Value = self.handle_response(response).await?;
        SubscriptionSnapshot::from_object(&object)
            .map_err(|e| AppError::Internal(format!("Unexpected Stripe subscription: {}", e)))
    }
}

/// Client errors carry a user-facing message. Rate limits, lock timeouts and
/// server errors are transient and stay retryable.
fn api_error(status: StatusCode, body: &str) -> AppError {
    let transient = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS | StatusCode::CONFLICT | StatusCode::REQUEST_TIMEOUT
    );
    if status.is_client_error()
        && !transient
        && let Ok(error) = serde_json::from_str::<StripeErrorResponse>(body)
    {
        return AppError::InvalidInput(format!(
            "Stripe error: {}",
            error.error.message.unwrap_or(error.error.error_type)
        ));
    }

    AppError::Internal(format!("Stripe API error: {} - {}", status, body))
}

// ============================================================================
// Stripe Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct StripeCustomer {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StripeCheckoutSession {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripePortalSession {
    url: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    #[serde(rename = "type")]
    error_type: String,
    message: Option<String>,
}
