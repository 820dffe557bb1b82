use actix_web::{post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use tracing::{debug, warn};

use crate::{
    errors::AppError,
    middlewares::user::optional_user,
    payments::{stripe, PaymentError, WebhookEvent},
    schema::payment::{CreateIntentRequest, IntentResponse, WebhookAck},
    services::{
        checkout,
        reconcile::{self, Purchaser},
    },
    store::Store,
    GlobalState,
};

/// Applies a provider event and builds the acknowledgement. Payments are
/// only honoured in the store currency.
pub(crate) async fn acknowledge(
    store: &dyn Store,
    event: WebhookEvent,
    currency: &str,
) -> Result<WebhookAck, AppError> {
    let outcome = match event {
        WebhookEvent::Succeeded(confirmation) => {
            reconcile::reconcile(store, confirmation, currency).await?
        }
        WebhookEvent::Failed(failure) => reconcile::record_failure(store, failure).await?,
        WebhookEvent::Ignored(kind) => {
            debug!(event = %kind, "ignoring webhook event");
            return Ok(WebhookAck::received());
        }
    };
    Ok(WebhookAck::with_status(outcome.status()))
}

#[post("/create-payment-intent")]
pub async fn create_payment_intent(
    req: HttpRequest,
    data: web::Data<GlobalState>,
    body: web::Json<CreateIntentRequest>,
) -> Result<HttpResponse, AppError> {
    let purchaser = Purchaser::from(optional_user(&req, &data).map(|u| u.id));
    let checkout = checkout::prepare(
        data.store.as_ref(),
        body.course_id,
        purchaser,
        &data.config.currency,
    )
    .await?;

    let intent = data.intents.create_intent(&checkout).await?;

    Ok(HttpResponse::Ok().json(IntentResponse {
        client_secret: intent.client_secret,
        course_id: checkout.course_id,
        price: checkout.amount,
    }))
}

#[post("/webhook")]
pub async fn stripe_webhook(
    req: HttpRequest,
    data: web::Data<GlobalState>,
    payload: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let signature = req
        .headers()
        .get(stripe::SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok());

    match (&data.config.stripe.webhook_secret, signature) {
        (Some(secret), Some(signature)) => {
            stripe::verify_signature(secret, signature, &payload, Utc::now().timestamp())
                .inspect_err(|e| warn!(error = %e, "rejected stripe webhook"))?;
        }
        (Some(_), None) => {
            warn!("rejected stripe webhook without signature");
            return Err(PaymentError::Signature("missing Stripe-Signature header".into()).into());
        }
        (None, _) => warn!("STRIPE_WEBHOOK_SECRET is not set, accepting unsigned webhook"),
    }

    let event = stripe::parse_event(&payload)?;
    let ack = acknowledge(data.store.as_ref(), event, &data.config.currency).await?;

    Ok(HttpResponse::Ok().json(ack))
}
