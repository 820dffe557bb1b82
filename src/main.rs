use std::sync::Arc;

use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::{middleware::Logger, web, App, HttpServer};
use config::AppConfig;
use dotenv::dotenv;
use errors::AppError;
use payments::{paypal::PaypalClient, stripe::StripeClient, IntentGateway, OrderGateway, Unconfigured};
use sqlx::postgres::PgPoolOptions;
use store::{PgStore, Store};
use tracing::{error, info, warn};

mod config;
mod errors;
mod handlers;
mod logging;
mod middlewares;
mod models;
mod payments;
mod schema;
mod services;
mod store;
mod utils;

#[cfg(test)]
mod test_init_app;

pub struct GlobalState {
    pub store: Arc<dyn Store>,
    pub config: AppConfig,
    pub intents: Arc<dyn IntentGateway>,
    pub orders: Arc<dyn OrderGateway>,
}

fn gateways(config: &AppConfig) -> (Arc<dyn IntentGateway>, Arc<dyn OrderGateway>) {
    let intents: Arc<dyn IntentGateway> = match StripeClient::from_config(&config.stripe) {
        Some(client) => Arc::new(client),
        None => {
            warn!("STRIPE_SECRET_KEY is not set, card payments are disabled");
            Arc::new(Unconfigured("Stripe"))
        }
    };
    let orders: Arc<dyn OrderGateway> = match PaypalClient::from_config(&config.paypal) {
        Some(client) => Arc::new(client),
        None => {
            warn!("PayPal credentials are not set, wallet payments are disabled");
            Arc::new(Unconfigured("PayPal"))
        }
    };
    (intents, orders)
}

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    dotenv().ok();
    logging::init_logger();

    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            error!(error = %e, "database connection failed");
            AppError::DbConnect
        })?;

    let store = PgStore::new(pool);
    store.migrate().await.map_err(|e| {
        error!(error = %e, "migrations failed");
        AppError::Migrate
    })?;

    let (intents, orders) = gateways(&config);
    let session_key = utils::session_key(&config.session_secret);
    let cookie_secure = config.session_cookie_secure;
    let address = config.bind_address.clone();

    let app_data = web::Data::new(GlobalState {
        store: Arc::new(store),
        config,
        intents,
        orders,
    });

    info!(%address, "server is starting");

    HttpServer::new(move || {
        App::new()
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), session_key.clone())
                    .cookie_secure(cookie_secure)
                    .build(),
            )
            .wrap(Logger::default())
            .app_data(app_data.clone())
            .configure(handlers::configure)
    })
    .bind(&address)
    .map_err(|_e| AppError::SocketBind)?
    .run()
    .await
    .map_err(|_e| AppError::ServerStart)?;

    Ok(())
}
