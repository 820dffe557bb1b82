use tracing::info;

use crate::{
    errors::AppError,
    models::review::NewReview,
    schema::{course::ReviewWithUser, review::CreateReview, UserSummary},
    store::Store,
};

pub const NOT_ENROLLED: &str = "You must be enrolled in this course to review it";

/// Creates or replaces the caller's review of a course they are enrolled in.
pub async fn submit(
    store: &dyn Store,
    user_id: i64,
    request: CreateReview,
) -> Result<ReviewWithUser, AppError> {
    request.validate()?;

    let course = store
        .find_course(request.course_id)
        .await?
        .ok_or_else(|| AppError::not_found("Course not found"))?;

    if store.find_enrollment(user_id, course.id).await?.is_none() {
        return Err(AppError::forbidden(NOT_ENROLLED));
    }

    let review = store
        .upsert_review(NewReview {
            user_id,
            course_id: course.id,
            rating: request.rating,
            comment: request.comment,
        })
        .await?;
    info!(review_id = review.id, user_id, course_id = course.id, rating = review.rating, "review saved");

    let user = store.find_user(user_id).await?;
    Ok(ReviewWithUser {
        review,
        user: user.as_ref().map(UserSummary::of),
    })
}
