//! Outbound payment providers and their webhook formats.

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    models::money::Money,
    services::reconcile::{PaymentConfirmation, PaymentFailure, Purchaser},
};

pub mod paypal;
pub mod stripe;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("{0}")]
    NotConfigured(&'static str),
    #[error("Webhook signature verification failed: {0}")]
    Signature(String),
    #[error("Malformed webhook payload: {0}")]
    Payload(String),
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{provider} answered {status}: {body}")]
    Provider {
        provider: &'static str,
        status: u16,
        body: String,
    },
}

/// What a checkout is for, priced server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    pub course_id: i64,
    pub course_title: String,
    pub purchaser: Purchaser,
    pub amount: Money,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIntent {
    pub id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedOrder {
    pub id: String,
    pub status: String,
}

/// Transmission headers the wallet provider signs its webhooks with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookHeaders {
    pub auth_algo: Option<String>,
    pub cert_url: Option<String>,
    pub transmission_id: Option<String>,
    pub transmission_sig: Option<String>,
    pub transmission_time: Option<String>,
}

/// A provider webhook reduced to what reconciliation needs.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    Succeeded(PaymentConfirmation),
    Failed(PaymentFailure),
    Ignored(String),
}

/// Card provider: payment intents confirmed client-side.
#[async_trait]
pub trait IntentGateway: Send + Sync {
    async fn create_intent(&self, checkout: &Checkout) -> Result<CreatedIntent, PaymentError>;
}

/// Wallet provider: orders created server-side and captured after approval.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn client_token(&self) -> Result<String, PaymentError>;

    async fn create_order(&self, checkout: &Checkout) -> Result<CreatedOrder, PaymentError>;

    async fn capture_order(&self, order_id: &str) -> Result<serde_json::Value, PaymentError>;

    async fn verify_webhook(
        &self,
        headers: &WebhookHeaders,
        event: &serde_json::Value,
    ) -> Result<(), PaymentError>;
}

/// Stands in for a provider whose credentials are absent.
pub struct Unconfigured(pub &'static str);

#[async_trait]
impl IntentGateway for Unconfigured {
    async fn create_intent(&self, _checkout: &Checkout) -> Result<CreatedIntent, PaymentError> {
        Err(PaymentError::NotConfigured(self.0))
    }
}

#[async_trait]
impl OrderGateway for Unconfigured {
    async fn client_token(&self) -> Result<String, PaymentError> {
        Err(PaymentError::NotConfigured(self.0))
    }

    async fn create_order(&self, _checkout: &Checkout) -> Result<CreatedOrder, PaymentError> {
        Err(PaymentError::NotConfigured(self.0))
    }

    async fn capture_order(&self, _order_id: &str) -> Result<serde_json::Value, PaymentError> {
        Err(PaymentError::NotConfigured(self.0))
    }

    async fn verify_webhook(
        &self,
        _headers: &WebhookHeaders,
        _event: &serde_json::Value,
    ) -> Result<(), PaymentError> {
        Err(PaymentError::NotConfigured(self.0))
    }
}

async fn provider_json<T: serde::de::DeserializeOwned>(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<T, PaymentError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PaymentError::Provider {
            provider,
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json::<T>().await?)
}
