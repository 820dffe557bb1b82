//! Wallet provider adapter speaking the PayPal Orders v2 and webhook formats.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{
    provider_json, Checkout, CreatedOrder, OrderGateway, PaymentError, WebhookEvent,
    WebhookHeaders,
};
use crate::{
    config::PaypalConfig,
    models::money::Money,
    services::reconcile::{PaymentConfirmation, PaymentFailure, Provider, Purchaser},
};

const PROVIDER: &str = "paypal";

pub struct PaypalClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    webhook_id: Option<String>,
    api_base: String,
}

#[derive(Deserialize)]
struct AccessToken {
    access_token: String,
}

#[derive(Deserialize)]
struct ClientToken {
    client_token: String,
}

#[derive(Deserialize)]
struct Verification {
    verification_status: String,
}

impl PaypalClient {
    pub fn from_config(config: &PaypalConfig) -> Option<Self> {
        Some(Self {
            http: reqwest::Client::new(),
            client_id: config.client_id.clone()?,
            client_secret: config.client_secret.clone()?,
            webhook_id: config.webhook_id.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }

    async fn access_token(&self) -> Result<String, PaymentError> {
        let response = self
            .http
            .post(self.url("/v1/oauth2/token"))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let token: AccessToken = provider_json(PROVIDER, response).await?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl OrderGateway for PaypalClient {
    async fn client_token(&self) -> Result<String, PaymentError> {
        let access = self.access_token().await?;
        let response = self
            .http
            .post(self.url("/v1/identity/generate-token"))
            .bearer_auth(access)
            .json(&json!({}))
            .send()
            .await?;

        let token: ClientToken = provider_json(PROVIDER, response).await?;
        Ok(token.client_token)
    }

    async fn create_order(&self, checkout: &Checkout) -> Result<CreatedOrder, PaymentError> {
        let access = self.access_token().await?;
        let body = json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "description": checkout.course_title,
                "custom_id": custom_id(checkout.course_id, checkout.purchaser),
                "amount": {
                    "currency_code": checkout.currency.to_uppercase(),
                    "value": checkout.amount.to_string(),
                },
            }],
        });

        let response = self
            .http
            .post(self.url("/v2/checkout/orders"))
            .bearer_auth(access)
            .json(&body)
            .send()
            .await?;

        let order: Value = provider_json(PROVIDER, response).await?;
        let field = |name: &str| order.get(name).and_then(Value::as_str).map(str::to_string);

        let created = CreatedOrder {
            id: field("id").ok_or_else(|| PaymentError::Payload("order without id".into()))?,
            status: field("status").unwrap_or_default(),
        };
        debug!(order_id = %created.id, course_id = checkout.course_id, "paypal order created");
        Ok(created)
    }

    async fn capture_order(&self, order_id: &str) -> Result<Value, PaymentError> {
        let access = self.access_token().await?;
        let response = self
            .http
            .post(self.url(&format!("/v2/checkout/orders/{order_id}/capture")))
            .bearer_auth(access)
            .json(&json!({}))
            .send()
            .await?;

        provider_json(PROVIDER, response).await
    }

    async fn verify_webhook(
        &self,
        headers: &WebhookHeaders,
        event: &Value,
    ) -> Result<(), PaymentError> {
        let Some(webhook_id) = &self.webhook_id else {
            warn!("PAYPAL_WEBHOOK_ID is not set, accepting unverified paypal webhook");
            return Ok(());
        };

        let access = self.access_token().await?;
        let body = json!({
            "auth_algo": headers.auth_algo,
            "cert_url": headers.cert_url,
            "transmission_id": headers.transmission_id,
            "transmission_sig": headers.transmission_sig,
            "transmission_time": headers.transmission_time,
            "webhook_id": webhook_id,
            "webhook_event": event,
        });

        let response = self
            .http
            .post(self.url("/v1/notifications/verify-webhook-signature"))
            .bearer_auth(access)
            .json(&body)
            .send()
            .await?;

        let verification: Verification = provider_json(PROVIDER, response).await?;
        if verification.verification_status == "SUCCESS" {
            Ok(())
        } else {
            Err(PaymentError::Signature(verification.verification_status))
        }
    }
}

/// `"<courseId>:<userId>"` or `"<courseId>:guest"`.
pub fn custom_id(course_id: i64, purchaser: Purchaser) -> String {
    format!("{course_id}:{}", purchaser.marker())
}

fn parse_custom_id(raw: &str) -> Option<(i64, Purchaser)> {
    let (course, purchaser) = raw.split_once(':').unwrap_or((raw, ""));
    let course_id = course.trim().parse().ok()?;
    Some((course_id, Purchaser::from_marker(Some(purchaser))))
}

#[derive(Deserialize)]
struct Event {
    event_type: String,
    #[serde(default)]
    resource: Resource,
}

#[derive(Deserialize, Default)]
struct Resource {
    id: Option<String>,
    custom_id: Option<String>,
    amount: Option<Amount>,
}

#[derive(Deserialize)]
struct Amount {
    value: String,
    #[serde(default)]
    currency_code: String,
}

impl Resource {
    fn purchase(&self) -> Result<(String, i64, Purchaser), PaymentError> {
        let (course_id, purchaser) = self
            .custom_id
            .as_deref()
            .and_then(parse_custom_id)
            .ok_or_else(|| PaymentError::Payload("Missing courseId".into()))?;
        let id = self
            .id
            .clone()
            .ok_or_else(|| PaymentError::Payload("Missing capture id".into()))?;
        Ok((id, course_id, purchaser))
    }
}

/// Reduces a webhook event to a reconciliation event.
pub fn parse_event(event: &Value) -> Result<WebhookEvent, PaymentError> {
    let event: Event = serde_json::from_value(event.clone())
        .map_err(|e| PaymentError::Payload(e.to_string()))?;

    match event.event_type.as_str() {
        "PAYMENT.CAPTURE.COMPLETED" => {
            let (provider_payment_id, course_id, purchaser) = event.resource.purchase()?;
            let captured = event
                .resource
                .amount
                .as_ref()
                .ok_or_else(|| PaymentError::Payload("Missing amount".into()))?;
            let amount = captured
                .value
                .parse::<Money>()
                .map_err(|e| PaymentError::Payload(e.to_string()))?;

            Ok(WebhookEvent::Succeeded(PaymentConfirmation {
                provider: Provider::Paypal,
                provider_payment_id,
                course_id,
                purchaser,
                amount,
                currency: captured.currency_code.to_ascii_lowercase(),
            }))
        }
        "PAYMENT.CAPTURE.DENIED" => {
            let (provider_payment_id, course_id, purchaser) = event.resource.purchase()?;
            Ok(WebhookEvent::Failed(PaymentFailure {
                provider: Provider::Paypal,
                provider_payment_id,
                course_id,
                purchaser,
            }))
        }
        _ => Ok(WebhookEvent::Ignored(event.event_type)),
    }
}
