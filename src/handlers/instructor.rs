use actix_web::{get, post, put, web, HttpResponse};

use crate::{
    errors::AppError,
    models::user::Instructor,
    schema::course::{CourseForm, LessonForm, ModuleForm},
    services::instructor,
    GlobalState,
};

#[get("/courses")]
pub async fn instructor_courses(
    data: web::Data<GlobalState>,
    me: web::ReqData<Instructor>,
) -> Result<HttpResponse, AppError> {
    let courses = instructor::courses(data.store.as_ref(), *me).await?;
    Ok(HttpResponse::Ok().json(courses))
}

#[get("/stats")]
pub async fn instructor_stats(
    data: web::Data<GlobalState>,
    me: web::ReqData<Instructor>,
) -> Result<HttpResponse, AppError> {
    let stats = instructor::stats(data.store.as_ref(), *me).await?;
    Ok(HttpResponse::Ok().json(stats))
}

#[post("/courses")]
pub async fn create_course(
    data: web::Data<GlobalState>,
    me: web::ReqData<Instructor>,
    body: web::Json<CourseForm>,
) -> Result<HttpResponse, AppError> {
    let course = instructor::create_course(data.store.as_ref(), *me, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(course))
}

#[put("/courses/{course_id}")]
pub async fn update_course(
    data: web::Data<GlobalState>,
    me: web::ReqData<Instructor>,
    path: web::Path<i64>,
    body: web::Json<CourseForm>,
) -> Result<HttpResponse, AppError> {
    let course =
        instructor::update_course(data.store.as_ref(), *me, path.into_inner(), body.into_inner())
            .await?;
    Ok(HttpResponse::Ok().json(course))
}

#[post("/courses/{course_id}/modules")]
pub async fn add_module(
    data: web::Data<GlobalState>,
    me: web::ReqData<Instructor>,
    path: web::Path<i64>,
    body: web::Json<ModuleForm>,
) -> Result<HttpResponse, AppError> {
    let module =
        instructor::add_module(data.store.as_ref(), *me, path.into_inner(), body.into_inner())
            .await?;
    Ok(HttpResponse::Created().json(module))
}

#[post("/modules/{module_id}/lessons")]
pub async fn add_lesson(
    data: web::Data<GlobalState>,
    me: web::ReqData<Instructor>,
    path: web::Path<i64>,
    body: web::Json<LessonForm>,
) -> Result<HttpResponse, AppError> {
    let lesson =
        instructor::add_lesson(data.store.as_ref(), *me, path.into_inner(), body.into_inner())
            .await?;
    Ok(HttpResponse::Created().json(lesson))
}
