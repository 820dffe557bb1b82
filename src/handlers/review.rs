use actix_web::{post, web, HttpResponse};

use crate::{
    errors::AppError, middlewares::user::AuthUser, schema::review::CreateReview,
    services::review, GlobalState,
};

#[post("")]
pub async fn submit_review(
    data: web::Data<GlobalState>,
    user: web::ReqData<AuthUser>,
    body: web::Json<CreateReview>,
) -> Result<HttpResponse, AppError> {
    let review = review::submit(data.store.as_ref(), user.id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(review))
}
