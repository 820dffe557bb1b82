use actix_web::{get, web, HttpResponse};

use crate::{errors::AppError, schema::course::CourseQuery, services::catalog, GlobalState};

#[get("/languages")]
pub async fn list_subjects(data: web::Data<GlobalState>) -> Result<HttpResponse, AppError> {
    let subjects = catalog::subjects(data.store.as_ref()).await?;
    Ok(HttpResponse::Ok().json(subjects))
}

#[get("")]
pub async fn list_courses(
    data: web::Data<GlobalState>,
    query: web::Query<CourseQuery>,
) -> Result<HttpResponse, AppError> {
    let (filter, page) = query.into_inner().into_parts()?;
    let page = catalog::browse(data.store.as_ref(), filter, page).await?;

    Ok(HttpResponse::Ok().json(page))
}

#[get("/{course_id}")]
pub async fn course_detail(
    data: web::Data<GlobalState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let detail = catalog::course_detail(data.store.as_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}
