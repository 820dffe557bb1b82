use async_trait::async_trait;

use super::{db_error, rows::ReviewRow, PgStore};
use crate::{
    models::review::{NewReview, Review},
    store::{ReviewStore, StoreError},
};

#[async_trait]
impl ReviewStore for PgStore {
    async fn upsert_review(&self, review: NewReview) -> Result<Review, StoreError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
                INSERT INTO reviews (user_id, course_id, rating, comment)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (user_id, course_id) DO UPDATE
                SET rating = EXCLUDED.rating,
                    comment = EXCLUDED.comment,
                    updated_at = now()
                RETURNING *
            "#,
        )
        .bind(review.user_id)
        .bind(review.course_id)
        .bind(review.rating)
        .bind(review.comment)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("review"))?;

        Ok(row.into())
    }
}
