use std::sync::Arc;

use actix_http::Request;
use actix_service::Service;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::{
    body::MessageBody,
    cookie::Key,
    dev::ServiceResponse,
    test::{self},
    web, App, Error,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::{
    config::{AppConfig, PaypalConfig, StripeConfig},
    handlers,
    models::{
        course::{Course, Lesson, Module, NewCourse, NewLesson, NewModule},
        money::Money,
        user::{NewUser, Role, User},
    },
    payments::{
        Checkout, CreatedIntent, CreatedOrder, IntentGateway, OrderGateway, PaymentError,
        WebhookHeaders,
    },
    store::{memory::MemoryStore, CatalogStore, UserStore},
    utils::issue_token,
    GlobalState,
};

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const WEBHOOK_SECRET: &str = "whsec_test";
pub const VALID_PAYPAL_SIGNATURE: &str = "valid-signature";

pub fn test_config() -> AppConfig {
    AppConfig {
        bind_address: "127.0.0.1:0".into(),
        database_url: "postgres://unused".into(),
        database_max_connections: 1,
        jwt_secret: JWT_SECRET.into(),
        session_secret: "test-session-secret".into(),
        session_cookie_secure: false,
        token_ttl_days: 7,
        currency: "usd".into(),
        stripe: StripeConfig {
            secret_key: None,
            webhook_secret: Some(WEBHOOK_SECRET.into()),
            api_base: "http://stripe.invalid".into(),
        },
        paypal: PaypalConfig {
            client_id: None,
            client_secret: None,
            webhook_id: Some("WH-TEST".into()),
            api_base: "http://paypal.invalid".into(),
        },
    }
}

/// Records every checkout it is asked to charge.
#[derive(Default)]
pub struct FakeIntents {
    checkouts: Mutex<Vec<Checkout>>,
}

impl FakeIntents {
    pub fn checkouts(&self) -> Vec<Checkout> {
        self.checkouts.lock().clone()
    }
}

#[async_trait]
impl IntentGateway for FakeIntents {
    async fn create_intent(&self, checkout: &Checkout) -> Result<CreatedIntent, PaymentError> {
        let mut checkouts = self.checkouts.lock();
        checkouts.push(checkout.clone());
        let id = format!("pi_test_{}", checkouts.len());
        Ok(CreatedIntent {
            client_secret: format!("{id}_secret"),
            id,
        })
    }
}

/// Accepts webhooks carrying [`VALID_PAYPAL_SIGNATURE`] only.
#[derive(Default)]
pub struct FakeOrders {
    checkouts: Mutex<Vec<Checkout>>,
}

impl FakeOrders {
    pub fn checkouts(&self) -> Vec<Checkout> {
        self.checkouts.lock().clone()
    }
}

#[async_trait]
impl OrderGateway for FakeOrders {
    async fn client_token(&self) -> Result<String, PaymentError> {
        Ok("fake-client-token".into())
    }

    async fn create_order(&self, checkout: &Checkout) -> Result<CreatedOrder, PaymentError> {
        let mut checkouts = self.checkouts.lock();
        checkouts.push(checkout.clone());
        Ok(CreatedOrder {
            id: format!("ORDER-{}", checkouts.len()),
            status: "CREATED".into(),
        })
    }

    async fn capture_order(&self, order_id: &str) -> Result<Value, PaymentError> {
        Ok(json!({"id": order_id, "status": "COMPLETED"}))
    }

    async fn verify_webhook(
        &self,
        headers: &WebhookHeaders,
        _event: &Value,
    ) -> Result<(), PaymentError> {
        match headers.transmission_sig.as_deref() {
            Some(VALID_PAYPAL_SIGNATURE) => Ok(()),
            other => Err(PaymentError::Signature(format!(
                "unexpected transmission signature {other:?}"
            ))),
        }
    }
}

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub intents: Arc<FakeIntents>,
    pub orders: Arc<FakeOrders>,
}

/// The full application over an in-memory store and fake providers.
pub async fn init() -> (
    impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error>,
    Fixture,
) {
    let fixture = Fixture {
        store: Arc::new(MemoryStore::new()),
        intents: Arc::new(FakeIntents::default()),
        orders: Arc::new(FakeOrders::default()),
    };

    let app_data = web::Data::new(GlobalState {
        store: fixture.store.clone(),
        config: test_config(),
        intents: fixture.intents.clone(),
        orders: fixture.orders.clone(),
    });

    let app = test::init_service(
        App::new()
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
                    .cookie_secure(false)
                    .build(),
            )
            .app_data(app_data)
            .configure(handlers::configure),
    )
    .await;

    (app, fixture)
}

pub fn token_for(user_id: i64) -> String {
    issue_token(user_id, JWT_SECRET, 1).unwrap()
}

pub async fn seed_user(store: &MemoryStore, username: &str, role: Role) -> User {
    store
        .create_user(NewUser {
            username: username.to_string(),
            password: "not-a-real-hash".to_string(),
            email: format!("{username}@example.com"),
            full_name: format!("{username} tester"),
            avatar: None,
            bio: Some(format!("{username} likes long division")),
            role,
        })
        .await
        .unwrap()
}

pub async fn seed_course(
    store: &MemoryStore,
    instructor_id: i64,
    subject_id: i64,
    title: &str,
    price_cents: i64,
) -> Course {
    store
        .create_course(NewCourse {
            title: title.to_string(),
            description: "A gentle introduction for young learners.".to_string(),
            price: Money::from_cents(price_cents),
            image_url: None,
            level: "beginner".to_string(),
            duration: 6,
            subject_id,
            instructor_id,
            featured: false,
            best_seller: false,
            is_new: true,
            grade_level: Some("3-5".to_string()),
            published_at: Some(chrono::Utc::now()),
        })
        .await
        .unwrap()
}

pub async fn seed_module(store: &MemoryStore, course_id: i64, order_index: i32) -> Module {
    store
        .create_module(NewModule {
            title: format!("Module {order_index}"),
            description: None,
            order_index,
            course_id,
        })
        .await
        .unwrap()
}

pub async fn seed_lesson(store: &MemoryStore, module_id: i64, order_index: i32) -> Lesson {
    store
        .create_lesson(NewLesson {
            title: format!("Lesson {order_index}"),
            description: None,
            content: Some("Count the apples.".to_string()),
            video_url: None,
            duration: Some(300),
            order_index,
            module_id,
        })
        .await
        .unwrap()
}
