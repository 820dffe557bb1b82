use actix_web::{get, post, web, HttpResponse};

use crate::{
    errors::AppError, middlewares::user::AuthUser, schema::enrollment::CreateEnrollment,
    services::enrollment, GlobalState,
};

#[post("")]
pub async fn create_enrollment(
    data: web::Data<GlobalState>,
    user: web::ReqData<AuthUser>,
    body: web::Json<CreateEnrollment>,
) -> Result<HttpResponse, AppError> {
    let enrollment = enrollment::enroll(data.store.as_ref(), user.id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(enrollment))
}

#[get("")]
pub async fn list_enrollments(
    data: web::Data<GlobalState>,
    user: web::ReqData<AuthUser>,
) -> Result<HttpResponse, AppError> {
    let enrollments = enrollment::enrollments(data.store.as_ref(), user.id).await?;
    Ok(HttpResponse::Ok().json(enrollments))
}
