use actix_web::{get, post, web, HttpRequest, HttpResponse};
use serde_json::Value;
use tracing::warn;

use super::payment::acknowledge;
use crate::{
    errors::AppError,
    middlewares::user::optional_user,
    payments::{paypal, WebhookHeaders},
    schema::payment::{PaypalOrderRequest, PaypalOrderResponse, PaypalSetup},
    services::{checkout, reconcile::Purchaser},
    GlobalState,
};

fn header(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
}

/// Orders are only created in the store currency; captures in any other
/// currency would not be honoured.
fn currency(requested: Option<&str>, store_currency: &str) -> Result<String, AppError> {
    match requested {
        None => Ok(store_currency.to_string()),
        Some(code) if code.trim().eq_ignore_ascii_case(store_currency) => {
            Ok(store_currency.to_string())
        }
        Some(code) => Err(AppError::validation(format!("Unsupported currency `{code}`"))),
    }
}

#[get("/setup")]
pub async fn paypal_setup(data: web::Data<GlobalState>) -> Result<HttpResponse, AppError> {
    let client_token = data.orders.client_token().await?;
    Ok(HttpResponse::Ok().json(PaypalSetup { client_token }))
}

#[post("/order")]
pub async fn create_order(
    req: HttpRequest,
    data: web::Data<GlobalState>,
    body: web::Json<PaypalOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let currency = currency(body.currency.as_deref(), &data.config.currency)?;
    let purchaser = Purchaser::from(optional_user(&req, &data).map(|u| u.id));
    let checkout = checkout::prepare(data.store.as_ref(), body.course_id, purchaser, &currency).await?;

    let order = data.orders.create_order(&checkout).await?;

    Ok(HttpResponse::Ok().json(PaypalOrderResponse {
        id: order.id,
        status: order.status,
    }))
}

#[post("/order/{order_id}/capture")]
pub async fn capture_order(
    data: web::Data<GlobalState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let captured = data.orders.capture_order(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(captured))
}

#[post("/webhook")]
pub async fn paypal_webhook(
    req: HttpRequest,
    data: web::Data<GlobalState>,
    event: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    let headers = WebhookHeaders {
        auth_algo: header(&req, "paypal-auth-algo"),
        cert_url: header(&req, "paypal-cert-url"),
        transmission_id: header(&req, "paypal-transmission-id"),
        transmission_sig: header(&req, "paypal-transmission-sig"),
        transmission_time: header(&req, "paypal-transmission-time"),
    };

    data.orders
        .verify_webhook(&headers, &event)
        .await
        .inspect_err(|e| warn!(error = %e, "rejected paypal webhook"))?;

    let event = paypal::parse_event(&event)?;
    let ack = acknowledge(data.store.as_ref(), event, &data.config.currency).await?;

    Ok(HttpResponse::Ok().json(ack))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    use super::currency;
    use crate::{
        models::user::Role,
        schema::payment::{PaypalOrderResponse, PaypalSetup, WebhookAck},
        services::reconcile::Purchaser,
        test_init_app::{init, seed_course, seed_user, token_for, VALID_PAYPAL_SIGNATURE},
    };

    fn capture(kind: &str, custom_id: &str, value: &str) -> Value {
        json!({
            "id": "WH-1",
            "event_type": kind,
            "resource": {
                "id": "CAP-42",
                "custom_id": custom_id,
                "amount": {"value": value, "currency_code": "USD"}
            }
        })
    }

    // Kept apart from the `actix_web::test` import, which would shadow the
    // `#[test]` attribute that `#[rstest]` expands to.
    mod currency_cases {
        use rstest::rstest;

        use super::currency;

        #[rstest]
        #[case(None, Ok("usd"))]
        #[case(Some("USD"), Ok("usd"))]
        #[case(Some("huf"), Err(()))]
        #[case(Some("EURO"), Err(()))]
        fn test_currency_override(#[case] requested: Option<&str>, #[case] expected: Result<&str, ()>) {
            assert_eq!(currency(requested, "usd").map_err(|_| ()), expected.map(str::to_string));
        }
    }

    #[actix_web::test]
    async fn test_setup_returns_client_token() {
        let (app, _fixture) = init().await;

        let res = test::TestRequest::get()
            .uri("/api/paypal/setup")
            .send_request(&app)
            .await;

        assert!(res.status().is_success());
        let body: PaypalSetup = test::read_body_json(res).await;
        assert_eq!(body.client_token, "fake-client-token");
    }

    #[actix_web::test]
    async fn test_create_order_for_signed_in_buyer() {
        let (app, fixture) = init().await;
        let math = fixture.store.add_subject("Mathematics", "MATH");
        let tutor = seed_user(&fixture.store, "tutor", Role::Instructor).await;
        let student = seed_user(&fixture.store, "student", Role::Student).await;
        let course = seed_course(&fixture.store, tutor.id, math.id, "Fractions made easy", 5999).await;

        let res = test::TestRequest::post()
            .insert_header(("Authorization", format!("Bearer {}", token_for(student.id))))
            .set_json(json!({"courseId": course.id, "currency": "USD"}))
            .uri("/api/paypal/order")
            .send_request(&app)
            .await;

        assert!(res.status().is_success());
        let order: PaypalOrderResponse = test::read_body_json(res).await;
        assert_eq!(order.status, "CREATED");

        let orders = fixture.orders.checkouts();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].purchaser, Purchaser::User(student.id));
        assert_eq!(orders[0].currency, "usd");
        assert_eq!(orders[0].amount, course.price);
    }

    #[actix_web::test]
    async fn test_create_order_rejects_bad_currency() {
        let (app, fixture) = init().await;

        let res = test::TestRequest::post()
            .set_json(json!({"courseId": 1, "currency": "dollars"}))
            .uri("/api/paypal/order")
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(fixture.orders.checkouts().is_empty());
    }

    #[actix_web::test]
    async fn test_capture_passes_provider_response_through() {
        let (app, _fixture) = init().await;

        let res = test::TestRequest::post()
            .uri("/api/paypal/order/ORDER-9/capture")
            .send_request(&app)
            .await;

        assert!(res.status().is_success());
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["id"], "ORDER-9");
        assert_eq!(body["status"], "COMPLETED");
    }

    #[actix_web::test]
    async fn test_verified_webhook_enrolls() {
        let (app, fixture) = init().await;
        let math = fixture.store.add_subject("Mathematics", "MATH");
        let tutor = seed_user(&fixture.store, "tutor", Role::Instructor).await;
        let student = seed_user(&fixture.store, "student", Role::Student).await;
        let course = seed_course(&fixture.store, tutor.id, math.id, "Fractions made easy", 5999).await;
        let event = capture(
            "PAYMENT.CAPTURE.COMPLETED",
            &format!("{}:{}", course.id, student.id),
            "59.99",
        );

        let res = test::TestRequest::post()
            .insert_header(("paypal-transmission-sig", VALID_PAYPAL_SIGNATURE))
            .set_json(event)
            .uri("/api/paypal/webhook")
            .send_request(&app)
            .await;

        assert!(res.status().is_success());
        let ack: WebhookAck = test::read_body_json(res).await;
        assert_eq!(ack.status.as_deref(), Some("enrolled"));
        assert_eq!(fixture.store.enrollment_rows(student.id, course.id), 1);
    }

    #[actix_web::test]
    async fn test_foreign_currency_capture_is_not_enrolled() {
        let (app, fixture) = init().await;
        let math = fixture.store.add_subject("Mathematics", "MATH");
        let tutor = seed_user(&fixture.store, "tutor", Role::Instructor).await;
        let student = seed_user(&fixture.store, "student", Role::Student).await;
        let course = seed_course(&fixture.store, tutor.id, math.id, "Fractions made easy", 5999).await;
        let mut event = capture(
            "PAYMENT.CAPTURE.COMPLETED",
            &format!("{}:{}", course.id, student.id),
            "59.99",
        );
        event["resource"]["amount"]["currency_code"] = json!("HUF");

        let res = test::TestRequest::post()
            .insert_header(("paypal-transmission-sig", VALID_PAYPAL_SIGNATURE))
            .set_json(event)
            .uri("/api/paypal/webhook")
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        let ack: WebhookAck = test::read_body_json(res).await;
        assert_eq!(ack.status.as_deref(), Some("amount_mismatch"));
        assert_eq!(fixture.store.enrollment_rows(student.id, course.id), 0);
    }

    #[actix_web::test]
    async fn test_foreign_currency_order_is_rejected() {
        let (app, fixture) = init().await;
        let math = fixture.store.add_subject("Mathematics", "MATH");
        let tutor = seed_user(&fixture.store, "tutor", Role::Instructor).await;
        let course = seed_course(&fixture.store, tutor.id, math.id, "Fractions made easy", 5999).await;

        let res = test::TestRequest::post()
            .set_json(json!({"courseId": course.id, "currency": "HUF"}))
            .uri("/api/paypal/order")
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(fixture.orders.checkouts().is_empty());
    }

    #[actix_web::test]
    async fn test_unverified_webhook_is_rejected() {
        let (app, fixture) = init().await;
        let math = fixture.store.add_subject("Mathematics", "MATH");
        let tutor = seed_user(&fixture.store, "tutor", Role::Instructor).await;
        let student = seed_user(&fixture.store, "student", Role::Student).await;
        let course = seed_course(&fixture.store, tutor.id, math.id, "Fractions made easy", 5999).await;
        let event = capture(
            "PAYMENT.CAPTURE.COMPLETED",
            &format!("{}:{}", course.id, student.id),
            "59.99",
        );

        let res = test::TestRequest::post()
            .insert_header(("paypal-transmission-sig", "forged"))
            .set_json(event)
            .uri("/api/paypal/webhook")
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(fixture.store.enrollment_rows(student.id, course.id), 0);
    }

    #[actix_web::test]
    async fn test_denied_capture_for_guest_is_acknowledged() {
        let (app, _fixture) = init().await;

        let res = test::TestRequest::post()
            .insert_header(("paypal-transmission-sig", VALID_PAYPAL_SIGNATURE))
            .set_json(capture("PAYMENT.CAPTURE.DENIED", "3:guest", "59.99"))
            .uri("/api/paypal/webhook")
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        let ack: WebhookAck = test::read_body_json(res).await;
        assert_eq!(ack.status.as_deref(), Some("payment_failed"));
    }

    #[actix_web::test]
    async fn test_unrelated_event_is_received() {
        let (app, _fixture) = init().await;

        let res = test::TestRequest::post()
            .insert_header(("paypal-transmission-sig", VALID_PAYPAL_SIGNATURE))
            .set_json(json!({"event_type": "CHECKOUT.ORDER.APPROVED", "resource": {}}))
            .uri("/api/paypal/webhook")
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        let ack: WebhookAck = test::read_body_json(res).await;
        assert!(ack.received);
        assert!(ack.status.is_none());
    }
}
