pub mod auth;
pub mod catalog;
pub mod enrollment;
pub mod instructor;
pub mod payment;
pub mod paypal;
pub mod progress;
pub mod review;

use actix_web::{
    middleware::from_fn,
    web::{self, scope},
};

use crate::{errors::AppError, middlewares};

/// Mounts every route under `/api`. Shared by the server and the tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::validation(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::validation(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|_err, _req| AppError::not_found("Resource not found").into()),
    )
    .service(
        scope("/api")
            // place this before /auth, else it is matched as a public route
            .service(
                scope("/auth/me")
                    .wrap(from_fn(middlewares::user::user_middleware))
                    .service(auth::me),
            )
            .service(
                scope("/auth")
                    .service(auth::register)
                    .service(auth::login)
                    .service(auth::logout),
            )
            .service(catalog::list_subjects)
            .service(
                scope("/courses")
                    .service(catalog::list_courses)
                    .service(catalog::course_detail),
            )
            .service(
                scope("/enrollments")
                    .wrap(from_fn(middlewares::user::user_middleware))
                    .service(enrollment::create_enrollment)
                    .service(enrollment::list_enrollments),
            )
            .service(
                scope("/lesson-progress")
                    .wrap(from_fn(middlewares::user::user_middleware))
                    .service(progress::report_progress)
                    .service(progress::lesson_progress),
            )
            .service(
                scope("/reviews")
                    .wrap(from_fn(middlewares::user::user_middleware))
                    .service(review::submit_review),
            )
            .service(payment::create_payment_intent)
            .service(payment::stripe_webhook)
            .service(
                scope("/paypal")
                    .service(paypal::paypal_setup)
                    .service(paypal::create_order)
                    .service(paypal::capture_order)
                    .service(paypal::paypal_webhook),
            )
            .service(
                // the instructor guard reads the identity set by the user guard
                scope("/instructor")
                    .wrap(from_fn(middlewares::instructor::instructor_middleware))
                    .wrap(from_fn(middlewares::user::user_middleware))
                    .service(instructor::instructor_courses)
                    .service(instructor::instructor_stats)
                    .service(instructor::create_course)
                    .service(instructor::update_course)
                    .service(instructor::add_module)
                    .service(instructor::add_lesson),
            ),
    );
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};

    use crate::{errors::CustomError, test_init_app::init};

    #[actix_web::test]
    async fn test_malformed_json_is_a_validation_error() {
        let (app, _fixture) = init().await;

        let res = test::TestRequest::post()
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{\"email\": ")
            .uri("/api/auth/login")
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: CustomError = test::read_body_json(res).await;
        assert!(!body.error.is_empty());
    }

    #[actix_web::test]
    async fn test_non_numeric_course_id_is_not_found() {
        let (app, _fixture) = init().await;

        let res = test::TestRequest::get()
            .uri("/api/courses/fractions")
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body: CustomError = test::read_body_json(res).await;
        assert_eq!(body.error, "Resource not found");
    }
}
