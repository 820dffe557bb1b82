use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use derive_more::derive::{Display, Error as DeriveMoreError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::{config::ConfigError, payments::PaymentError, store::StoreError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Cant connect to the DB")]
    DbConnect,
    #[error("Cant run the database migrations")]
    Migrate,
    #[error("Cant bind to the Socket")]
    SocketBind,
    #[error("Cant start the server")]
    ServerStart,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("Internal server error")]
    InternalError,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict(message.into())
    }
}

/// JSON error body: `{"error": "..."}`.
#[derive(Debug, Display, DeriveMoreError, Serialize, Deserialize)]
#[display("error :{}", error)]
pub struct CustomError {
    pub error: String,
}

impl ResponseError for CustomError {}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code()).json(CustomError {
            error: self.to_string(),
        })
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_)
            | AppError::DbConnect
            | AppError::Migrate
            | AppError::SocketBind
            | AppError::ServerStart
            | AppError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(entity) => AppError::Conflict(format!("{entity} already exists")),
            StoreError::MissingReference(entity) => {
                AppError::NotFound(format!("Referenced {entity} not found"))
            }
            StoreError::Database(_) | StoreError::Corrupt(_) => {
                error!(error = %err, "store operation failed");
                AppError::InternalError
            }
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotConfigured(provider) => {
                AppError::Unavailable(format!("{provider} payments are not configured"))
            }
            PaymentError::Signature(_) | PaymentError::Payload(_) => {
                AppError::Validation(err.to_string())
            }
            PaymentError::Http(_) | PaymentError::Provider { .. } => {
                error!(error = %err, "payment provider call failed");
                AppError::InternalError
            }
        }
    }
}
