use async_trait::async_trait;

use super::{
    db_error,
    rows::{CourseRow, RecentEnrollmentRow, RecentReviewRow},
    PgStore,
};
use crate::{
    models::{
        course::Course,
        enrollment::PaymentStatus,
        instructor::{RecentEnrollment, RecentReview},
        money::Money,
    },
    store::{InstructorStore, StoreError},
};

#[async_trait]
impl InstructorStore for PgStore {
    async fn instructor_courses(&self, instructor_id: i64) -> Result<Vec<Course>, StoreError> {
        let found = sqlx::query_as::<_, CourseRow>(
            "SELECT * FROM courses WHERE instructor_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(instructor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("course"))?;

        Ok(found.into_iter().map(Course::from).collect())
    }

    async fn enrollment_count(&self, course_id: i64) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM enrollments WHERE course_id = $1")
            .bind(course_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("enrollment"))
    }

    async fn student_count(&self, instructor_id: i64) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>(
            r#"
                SELECT COUNT(DISTINCT e.user_id)
                FROM enrollments e
                JOIN courses c ON c.id = e.course_id
                WHERE c.instructor_id = $1
            "#,
        )
        .bind(instructor_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("enrollment"))
    }

    async fn revenue(&self, instructor_id: i64) -> Result<Money, StoreError> {
        let cents = sqlx::query_scalar::<_, i64>(
            r#"
                SELECT COALESCE(SUM(e.payment_amount_cents), 0)::bigint
                FROM enrollments e
                JOIN courses c ON c.id = e.course_id
                WHERE c.instructor_id = $1 AND e.payment_status = $2
            "#,
        )
        .bind(instructor_id)
        .bind(PaymentStatus::Completed.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("enrollment"))?;

        Ok(Money::from_cents(cents))
    }

    async fn average_rating(&self, instructor_id: i64) -> Result<Option<f64>, StoreError> {
        sqlx::query_scalar::<_, Option<f64>>(
            r#"
                SELECT AVG(r.rating)::float8
                FROM reviews r
                JOIN courses c ON c.id = r.course_id
                WHERE c.instructor_id = $1
            "#,
        )
        .bind(instructor_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("review"))
    }

    async fn recent_enrollments(
        &self,
        instructor_id: i64,
        limit: i64,
    ) -> Result<Vec<RecentEnrollment>, StoreError> {
        let found = sqlx::query_as::<_, RecentEnrollmentRow>(
            r#"
                SELECT e.id AS enrollment_id, e.enrolled_at, c.id AS course_id,
                       c.title AS course_title, e.user_id
                FROM enrollments e
                JOIN courses c ON c.id = e.course_id
                WHERE c.instructor_id = $1
                ORDER BY e.enrolled_at DESC, e.id DESC
                LIMIT $2
            "#,
        )
        .bind(instructor_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("enrollment"))?;

        Ok(found.into_iter().map(RecentEnrollment::from).collect())
    }

    async fn recent_reviews(
        &self,
        instructor_id: i64,
        limit: i64,
    ) -> Result<Vec<RecentReview>, StoreError> {
        let found = sqlx::query_as::<_, RecentReviewRow>(
            r#"
                SELECT r.id AS review_id, r.rating, r.comment, r.created_at,
                       c.id AS course_id, c.title AS course_title,
                       r.user_id, u.full_name AS user_name
                FROM reviews r
                JOIN courses c ON c.id = r.course_id
                JOIN users u ON u.id = r.user_id
                WHERE c.instructor_id = $1
                ORDER BY r.created_at DESC, r.id DESC
                LIMIT $2
            "#,
        )
        .bind(instructor_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("review"))?;

        Ok(found.into_iter().map(RecentReview::from).collect())
    }
}
