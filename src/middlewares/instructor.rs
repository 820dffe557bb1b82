use actix_web::{
    body::{EitherBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web, Error, HttpMessage, ResponseError,
};

use super::user::AuthUser;
use crate::{errors::AppError, models::user::Instructor, GlobalState};

async fn authorize(req: &ServiceRequest) -> Result<Instructor, AppError> {
    let auth = req
        .extensions()
        .get::<AuthUser>()
        .copied()
        .ok_or_else(|| AppError::unauthorized("No token provided"))?;

    let data = req
        .app_data::<web::Data<GlobalState>>()
        .cloned()
        .ok_or(AppError::InternalError)?;

    let user = data
        .store
        .find_user(auth.id)
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid token"))?;

    user.role
        .instructor_capability(user.id)
        .ok_or_else(|| AppError::forbidden("Access denied. Instructor role required."))
}

/// Runs after [`user_middleware`](super::user::user_middleware): loads the
/// caller once and attaches an [`Instructor`] capability when their role
/// grants one.
pub async fn instructor_middleware(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<EitherBody<impl MessageBody>>, Error> {
    match authorize(&req).await {
        Ok(instructor) => {
            req.extensions_mut().insert(instructor);
            next.call(req).await.map(ServiceResponse::map_into_left_body)
        }
        Err(err) => Ok(req.into_response(err.error_response()).map_into_right_body()),
    }
}
