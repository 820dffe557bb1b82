use crate::{
    errors::AppError,
    models::enrollment::PaymentStatus,
    payments::Checkout,
    services::{enrollment::ALREADY_ENROLLED, reconcile::Purchaser},
    store::Store,
};

/// Prices a checkout from the stored course. Buyers who already paid for
/// the course are turned away; guests always may proceed.
pub async fn prepare(
    store: &dyn Store,
    course_id: i64,
    purchaser: Purchaser,
    currency: &str,
) -> Result<Checkout, AppError> {
    let course = store
        .find_course(course_id)
        .await?
        .ok_or_else(|| AppError::not_found("Course not found"))?;

    if let Purchaser::User(user_id) = purchaser {
        let paid = store
            .find_enrollment(user_id, course.id)
            .await?
            .is_some_and(|e| e.payment_status == PaymentStatus::Completed);
        if paid {
            return Err(AppError::conflict(ALREADY_ENROLLED));
        }
    }

    Ok(Checkout {
        course_id: course.id,
        course_title: course.title,
        purchaser,
        amount: course.price,
        currency: currency.to_string(),
    })
}
