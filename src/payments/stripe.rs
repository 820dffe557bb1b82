//! Card provider adapter speaking the Stripe REST and webhook formats.

use std::collections::HashMap;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::debug;

use super::{provider_json, Checkout, CreatedIntent, IntentGateway, PaymentError, WebhookEvent};
use crate::{
    config::StripeConfig,
    models::money::Money,
    services::reconcile::{PaymentConfirmation, PaymentFailure, Provider, Purchaser},
};

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Maximum age of a signed webhook, in seconds.
const TOLERANCE_SECS: i64 = 300;

const PROVIDER: &str = "stripe";

type HmacSha256 = Hmac<Sha256>;

pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeClient {
    pub fn from_config(config: &StripeConfig) -> Option<Self> {
        let secret_key = config.secret_key.clone()?;
        Some(Self {
            http: reqwest::Client::new(),
            secret_key,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Deserialize)]
struct IntentBody {
    id: String,
    client_secret: String,
}

#[async_trait]
impl IntentGateway for StripeClient {
    async fn create_intent(&self, checkout: &Checkout) -> Result<CreatedIntent, PaymentError> {
        let form = [
            ("amount", checkout.amount.cents().to_string()),
            ("currency", checkout.currency.to_lowercase()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
            ("metadata[courseId]", checkout.course_id.to_string()),
            ("metadata[userId]", checkout.purchaser.marker()),
            ("metadata[courseTitle]", checkout.course_title.clone()),
        ];

        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await?;

        let body: IntentBody = provider_json(PROVIDER, response).await?;
        debug!(intent_id = %body.id, course_id = checkout.course_id, "payment intent created");

        Ok(CreatedIntent {
            id: body.id,
            client_secret: body.client_secret,
        })
    }
}

/// Hex HMAC-SHA256 over `"{timestamp}.{payload}"`.
pub fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String, PaymentError> {
    let mac = signing_mac(secret, timestamp, payload)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn signing_mac(secret: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, PaymentError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::Signature(e.to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Checks a `t=<unix>,v1=<hex>` header against the payload. Any one of
/// several `v1` entries may match.
pub fn verify_signature(
    secret: &str,
    header: &str,
    payload: &[u8],
    now: i64,
) -> Result<(), PaymentError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| PaymentError::Signature("missing timestamp".into()))?;
    if signatures.is_empty() {
        return Err(PaymentError::Signature("missing v1 signature".into()));
    }
    if (now - timestamp).abs() > TOLERANCE_SECS {
        return Err(PaymentError::Signature("timestamp outside tolerance".into()));
    }

    let mac = signing_mac(secret, timestamp, payload)?;
    let matched = signatures
        .iter()
        .filter_map(|sig| hex::decode(sig).ok())
        .any(|sig| mac.clone().verify_slice(&sig).is_ok());

    if matched {
        Ok(())
    } else {
        Err(PaymentError::Signature("no matching signature".into()))
    }
}

#[derive(Deserialize)]
struct Event {
    #[serde(rename = "type")]
    kind: String,
    data: EventData,
}

#[derive(Deserialize)]
struct EventData {
    object: serde_json::Value,
}

#[derive(Deserialize)]
struct IntentObject {
    id: String,
    #[serde(default)]
    amount: i64,
    amount_received: Option<i64>,
    #[serde(default)]
    currency: String,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl IntentObject {
    fn course_id(&self) -> Result<i64, PaymentError> {
        self.metadata
            .get("courseId")
            .and_then(|id| id.parse().ok())
            .ok_or_else(|| PaymentError::Payload("Missing courseId".into()))
    }

    fn purchaser(&self) -> Purchaser {
        Purchaser::from_marker(self.metadata.get("userId").map(String::as_str))
    }
}

/// Reduces a verified webhook body to a reconciliation event.
pub fn parse_event(payload: &[u8]) -> Result<WebhookEvent, PaymentError> {
    let event: Event = serde_json::from_slice(payload)
        .map_err(|e| PaymentError::Payload(e.to_string()))?;
    let intent = || -> Result<IntentObject, PaymentError> {
        serde_json::from_value(event.data.object.clone())
            .map_err(|e| PaymentError::Payload(e.to_string()))
    };

    match event.kind.as_str() {
        "payment_intent.succeeded" => {
            let intent = intent()?;
            let cents = intent.amount_received.unwrap_or(intent.amount);
            Ok(WebhookEvent::Succeeded(PaymentConfirmation {
                provider: Provider::Stripe,
                course_id: intent.course_id()?,
                purchaser: intent.purchaser(),
                amount: Money::from_cents(cents),
                currency: intent.currency.to_ascii_lowercase(),
                provider_payment_id: intent.id,
            }))
        }
        "payment_intent.payment_failed" => {
            let intent = intent()?;
            Ok(WebhookEvent::Failed(PaymentFailure {
                provider: Provider::Stripe,
                course_id: intent.course_id()?,
                purchaser: intent.purchaser(),
                provider_payment_id: intent.id,
            }))
        }
        _ => Ok(WebhookEvent::Ignored(event.kind.clone())),
    }
}
