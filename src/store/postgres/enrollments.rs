use async_trait::async_trait;

use super::{
    db_error,
    rows::{EnrollmentRow, ProgressRow},
    PgStore,
};
use crate::{
    models::{
        enrollment::{
            Enrollment, LessonCounts, NewEnrollment, PaidEnrollment, PaymentStatus,
            ProgressUpdate,
        },
        progress::{LessonProgress, ProgressPatch},
    },
    store::{EnrollmentStore, StoreError},
};

#[async_trait]
impl EnrollmentStore for PgStore {
    async fn find_enrollment(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> Result<Option<Enrollment>, StoreError> {
        sqlx::query_as::<_, EnrollmentRow>(
            "SELECT * FROM enrollments WHERE user_id = $1 AND course_id = $2",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("enrollment"))?
        .map(Enrollment::try_from)
        .transpose()
    }

    async fn insert_enrollment(
        &self,
        enrollment: NewEnrollment,
    ) -> Result<Enrollment, StoreError> {
        let row = sqlx::query_as::<_, EnrollmentRow>(
            r#"
                INSERT INTO enrollments (
                    user_id, course_id, payment_status, payment_amount_cents, payment_id
                )
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            "#,
        )
        .bind(enrollment.user_id)
        .bind(enrollment.course_id)
        .bind(enrollment.payment_status.as_str())
        .bind(enrollment.payment_amount.cents())
        .bind(enrollment.payment_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("enrollment"))?;

        row.try_into()
    }

    async fn upsert_paid_enrollment(
        &self,
        payment: PaidEnrollment,
    ) -> Result<Enrollment, StoreError> {
        let row = sqlx::query_as::<_, EnrollmentRow>(
            r#"
                INSERT INTO enrollments (
                    user_id, course_id, payment_status, payment_id, payment_amount_cents, progress
                )
                VALUES ($1, $2, $3, $4, $5, 0)
                ON CONFLICT (user_id, course_id) DO UPDATE
                SET payment_status = EXCLUDED.payment_status,
                    payment_id = EXCLUDED.payment_id,
                    payment_amount_cents = EXCLUDED.payment_amount_cents,
                    updated_at = now()
                RETURNING *
            "#,
        )
        .bind(payment.user_id)
        .bind(payment.course_id)
        .bind(PaymentStatus::Completed.as_str())
        .bind(payment.payment_id)
        .bind(payment.payment_amount.cents())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("enrollment"))?;

        row.try_into()
    }

    async fn mark_payment_failed(
        &self,
        user_id: i64,
        course_id: i64,
        payment_id: &str,
    ) -> Result<Option<Enrollment>, StoreError> {
        sqlx::query_as::<_, EnrollmentRow>(
            r#"
                UPDATE enrollments
                SET payment_status = $3, payment_id = $4, updated_at = now()
                WHERE user_id = $1 AND course_id = $2 AND payment_status <> $5
                RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .bind(PaymentStatus::Failed.as_str())
        .bind(payment_id)
        .bind(PaymentStatus::Completed.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("enrollment"))?
        .map(Enrollment::try_from)
        .transpose()
    }

    async fn update_progress(
        &self,
        user_id: i64,
        course_id: i64,
        update: ProgressUpdate,
    ) -> Result<Option<Enrollment>, StoreError> {
        sqlx::query_as::<_, EnrollmentRow>(
            r#"
                UPDATE enrollments
                SET progress = $3, completed = $4, completed_at = $5, updated_at = now()
                WHERE user_id = $1 AND course_id = $2
                RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .bind(update.progress)
        .bind(update.completed)
        .bind(update.completed_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("enrollment"))?
        .map(Enrollment::try_from)
        .transpose()
    }

    async fn user_enrollments(&self, user_id: i64) -> Result<Vec<Enrollment>, StoreError> {
        sqlx::query_as::<_, EnrollmentRow>(
            "SELECT * FROM enrollments WHERE user_id = $1 ORDER BY enrolled_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("enrollment"))?
        .into_iter()
        .map(Enrollment::try_from)
        .collect()
    }

    async fn find_progress(
        &self,
        user_id: i64,
        lesson_id: i64,
    ) -> Result<Option<LessonProgress>, StoreError> {
        let found = sqlx::query_as::<_, ProgressRow>(
            "SELECT * FROM lesson_progress WHERE user_id = $1 AND lesson_id = $2",
        )
        .bind(user_id)
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("lesson progress"))?;

        Ok(found.map(LessonProgress::from))
    }

    async fn upsert_progress(
        &self,
        user_id: i64,
        lesson_id: i64,
        patch: ProgressPatch,
    ) -> Result<LessonProgress, StoreError> {
        let row = sqlx::query_as::<_, ProgressRow>(
            r#"
                INSERT INTO lesson_progress (user_id, lesson_id, completed, last_position)
                VALUES ($1, $2, COALESCE($3, false), COALESCE($4, 0))
                ON CONFLICT (user_id, lesson_id) DO UPDATE
                SET completed = COALESCE($3, lesson_progress.completed),
                    last_position = COALESCE($4, lesson_progress.last_position),
                    updated_at = now()
                RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(lesson_id)
        .bind(patch.completed)
        .bind(patch.last_position)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("lesson progress"))?;

        Ok(row.into())
    }

    async fn lesson_counts(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> Result<LessonCounts, StoreError> {
        let (total, completed) = sqlx::query_as::<_, (i64, i64)>(
            r#"
                SELECT COUNT(l.id), COUNT(lp.id) FILTER (WHERE lp.completed)
                FROM lessons l
                JOIN modules m ON m.id = l.module_id
                LEFT JOIN lesson_progress lp ON lp.lesson_id = l.id AND lp.user_id = $1
                WHERE m.course_id = $2
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("lesson progress"))?;

        Ok(LessonCounts { total, completed })
    }
}
