use actix_web::{get, post, web, HttpResponse};

use crate::{
    errors::AppError, middlewares::user::AuthUser, schema::enrollment::ProgressReport,
    services::progress, GlobalState,
};

#[post("")]
pub async fn report_progress(
    data: web::Data<GlobalState>,
    user: web::ReqData<AuthUser>,
    body: web::Json<ProgressReport>,
) -> Result<HttpResponse, AppError> {
    let record = progress::report(data.store.as_ref(), user.id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(record))
}

#[get("/{lesson_id}")]
pub async fn lesson_progress(
    data: web::Data<GlobalState>,
    user: web::ReqData<AuthUser>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let view = progress::lesson_progress(data.store.as_ref(), user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(view))
}
