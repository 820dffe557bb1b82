//! Process configuration, read once at start-up.

use std::env;

use thiserror::Error;

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";
const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
const DEFAULT_PAYPAL_API_BASE: &str = "https://api-m.sandbox.paypal.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value `{value}`")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: Option<String>,
    pub webhook_secret: Option<String>,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct PaypalConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub webhook_id: Option<String>,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: String,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub session_secret: String,
    pub session_cookie_secure: bool,
    pub token_ttl_days: i64,
    pub currency: String,
    pub stripe: StripeConfig,
    pub paypal: PaypalConfig,
}

impl AppConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| optional(key).ok_or(ConfigError::Missing(key));

        Ok(Self {
            bind_address: optional("BIND_ADDRESS")
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            database_url: required("DATABASE_URL")?,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", optional, 5)?,
            jwt_secret: required("JWT_SECRET")?,
            session_secret: required("SESSION_SECRET")?,
            session_cookie_secure: flag_or("SESSION_COOKIE_SECURE", optional, true)?,
            token_ttl_days: parse_or("TOKEN_TTL_DAYS", optional, 7)?,
            currency: optional("PAYMENT_CURRENCY")
                .unwrap_or_else(|| "usd".to_string())
                .to_lowercase(),
            stripe: StripeConfig {
                secret_key: optional("STRIPE_SECRET_KEY"),
                webhook_secret: optional("STRIPE_WEBHOOK_SECRET"),
                api_base: optional("STRIPE_API_BASE")
                    .unwrap_or_else(|| DEFAULT_STRIPE_API_BASE.to_string()),
            },
            paypal: PaypalConfig {
                client_id: optional("PAYPAL_CLIENT_ID"),
                client_secret: optional("PAYPAL_CLIENT_SECRET"),
                webhook_id: optional("PAYPAL_WEBHOOK_ID"),
                api_base: optional("PAYPAL_API_BASE")
                    .unwrap_or_else(|| DEFAULT_PAYPAL_API_BASE.to_string()),
            },
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    lookup: impl Fn(&str) -> Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn flag_or(
    key: &'static str,
    lookup: impl Fn(&str) -> Option<String>,
    default: bool,
) -> Result<bool, ConfigError> {
    match lookup(key).as_deref().map(str::trim) {
        None => Ok(default),
        Some("1" | "true" | "yes") => Ok(true),
        Some("0" | "false" | "no") => Ok(false),
        Some(other) => Err(ConfigError::Invalid {
            key,
            value: other.to_string(),
        }),
    }
}
