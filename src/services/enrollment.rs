use std::collections::HashMap;

use tracing::info;

use super::progress::progress_percentage;
use crate::{
    errors::AppError,
    models::{
        enrollment::{Enrollment, NewEnrollment, PaymentStatus},
        subject::Subject,
        user::User,
    },
    schema::{
        enrollment::{CreateEnrollment, EnrolledCourse, EnrollmentView},
        SubjectSummary, UserSummary,
    },
    store::{Store, StoreError},
};

pub const ALREADY_ENROLLED: &str = "You are already enrolled in this course";

/// Direct enrollment. Not idempotent: a second call for the same pair fails.
pub async fn enroll(
    store: &dyn Store,
    user_id: i64,
    request: CreateEnrollment,
) -> Result<Enrollment, AppError> {
    request.validate()?;
    let course = store
        .find_course(request.course_id)
        .await?
        .ok_or_else(|| AppError::not_found("Course not found"))?;

    if store.find_enrollment(user_id, course.id).await?.is_some() {
        return Err(AppError::conflict(ALREADY_ENROLLED));
    }

    let payment_status = if request.payment_id.is_some() {
        PaymentStatus::Completed
    } else {
        PaymentStatus::Pending
    };

    let enrollment = store
        .insert_enrollment(NewEnrollment {
            user_id,
            course_id: course.id,
            payment_status,
            payment_amount: request.amount_or(course.price),
            payment_id: request.payment_id,
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => AppError::conflict(ALREADY_ENROLLED),
            other => other.into(),
        })?;

    info!(
        enrollment_id = enrollment.id,
        user_id,
        course_id = course.id,
        status = %enrollment.payment_status,
        "enrollment created"
    );
    Ok(enrollment)
}

/// The caller's enrollments with progress recomputed from lesson records.
pub async fn enrollments(store: &dyn Store, user_id: i64) -> Result<Vec<EnrollmentView>, AppError> {
    let enrollments = store.user_enrollments(user_id).await?;

    let mut views = Vec::with_capacity(enrollments.len());
    let mut subjects: HashMap<i64, Option<Subject>> = HashMap::new();
    let mut instructors: HashMap<i64, Option<User>> = HashMap::new();

    for mut enrollment in enrollments {
        let counts = store.lesson_counts(user_id, enrollment.course_id).await?;
        enrollment.progress = progress_percentage(counts);

        let course = match store.find_course(enrollment.course_id).await? {
            Some(course) => {
                if !subjects.contains_key(&course.subject_id) {
                    let subject = store.find_subject(course.subject_id).await?;
                    subjects.insert(course.subject_id, subject);
                }
                if !instructors.contains_key(&course.instructor_id) {
                    let instructor = store.find_user(course.instructor_id).await?;
                    instructors.insert(course.instructor_id, instructor);
                }

                Some(EnrolledCourse {
                    subject: subjects
                        .get(&course.subject_id)
                        .and_then(Option::as_ref)
                        .map(SubjectSummary::from),
                    instructor: instructors
                        .get(&course.instructor_id)
                        .and_then(Option::as_ref)
                        .map(UserSummary::of),
                    course,
                })
            }
            None => None,
        };

        views.push(EnrollmentView {
            enrollment,
            course,
            total_lessons: counts.total,
            completed_lessons: counts.completed,
        });
    }

    Ok(views)
}
