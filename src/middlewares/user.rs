use actix_session::{Session, SessionExt};
use actix_web::{
    body::{EitherBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    http::header::{HeaderMap, AUTHORIZATION},
    middleware::Next,
    web, Error, HttpMessage, HttpRequest, ResponseError,
};
use tracing::debug;

use crate::{errors::AppError, utils::decode_token, GlobalState};

pub const SESSION_TOKEN_KEY: &str = "token";

/// Identity attached to requests that passed the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
}

/// Session token first, then `Authorization: Bearer`.
fn find_token(session: &Session, headers: &HeaderMap) -> Option<String> {
    if let Ok(Some(token)) = session.get::<String>(SESSION_TOKEN_KEY) {
        return Some(token);
    }

    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn state(data: Option<&web::Data<GlobalState>>) -> Result<&web::Data<GlobalState>, AppError> {
    data.ok_or_else(|| {
        tracing::error!("application state missing from request");
        AppError::InternalError
    })
}

fn authenticate(req: &ServiceRequest) -> Result<AuthUser, AppError> {
    let token = find_token(&req.get_session(), req.headers())
        .ok_or_else(|| AppError::unauthorized("No token provided"))?;

    let data = state(req.app_data::<web::Data<GlobalState>>())?;
    let id = decode_token(&token, &data.config.jwt_secret).ok_or_else(|| {
        debug!(path = req.path(), "rejected invalid token");
        AppError::unauthorized("Invalid token")
    })?;

    Ok(AuthUser { id })
}

/// Rejections are rendered here so callers see the JSON error response.
pub async fn user_middleware(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<EitherBody<impl MessageBody>>, Error> {
    match authenticate(&req) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.call(req).await.map(ServiceResponse::map_into_left_body)
        }
        Err(err) => Ok(req.into_response(err.error_response()).map_into_right_body()),
    }
}

/// Resolves the caller on public routes. Missing or invalid tokens mean a
/// guest.
pub fn optional_user(req: &HttpRequest, data: &GlobalState) -> Option<AuthUser> {
    let token = find_token(&req.get_session(), req.headers())?;
    decode_token(&token, &data.config.jwt_secret).map(|id| AuthUser { id })
}
