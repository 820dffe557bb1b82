use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use super::{
    db_error, like_pattern,
    rows::{CourseRow, LessonRow, ModuleRow, RatingRow, ReviewRow, SubjectRow},
    PgStore,
};
use crate::{
    models::{
        course::{
            Course, CourseFilter, CourseUpdate, Lesson, Module, NewCourse, NewLesson, NewModule,
            PageWindow, RatingStats,
        },
        review::Review,
        subject::Subject,
    },
    store::{CatalogStore, StoreError},
};

fn push_course_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &CourseFilter) {
    query.push(" WHERE TRUE");
    if let Some(subject_id) = filter.subject_id {
        query.push(" AND subject_id = ").push_bind(subject_id);
    }
    if let Some(level) = &filter.level {
        query.push(" AND level = ").push_bind(level.clone());
    }
    if filter.featured {
        query.push(" AND featured");
    }
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        query
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_subjects(&self) -> Result<Vec<Subject>, StoreError> {
        let found = sqlx::query_as::<_, SubjectRow>("SELECT * FROM subjects ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("subject"))?;

        Ok(found.into_iter().map(Subject::from).collect())
    }

    async fn subjects_by_ids(&self, ids: &[i64]) -> Result<Vec<Subject>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found = sqlx::query_as::<_, SubjectRow>("SELECT * FROM subjects WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("subject"))?;

        Ok(found.into_iter().map(Subject::from).collect())
    }

    async fn find_subject(&self, id: i64) -> Result<Option<Subject>, StoreError> {
        let found = sqlx::query_as::<_, SubjectRow>("SELECT * FROM subjects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("subject"))?;

        Ok(found.map(Subject::from))
    }

    async fn list_courses(
        &self,
        filter: &CourseFilter,
        window: PageWindow,
    ) -> Result<Vec<Course>, StoreError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM courses");
        push_course_filter(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(window.limit)
            .push(" OFFSET ")
            .push_bind(window.offset);

        let found = query
            .build_query_as::<CourseRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("course"))?;

        Ok(found.into_iter().map(Course::from).collect())
    }

    async fn count_courses(&self, filter: &CourseFilter) -> Result<i64, StoreError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM courses");
        push_course_filter(&mut query, filter);

        query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("course"))
    }

    async fn find_course(&self, id: i64) -> Result<Option<Course>, StoreError> {
        let found = sqlx::query_as::<_, CourseRow>("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("course"))?;

        Ok(found.map(Course::from))
    }

    async fn create_course(&self, course: NewCourse) -> Result<Course, StoreError> {
        let row = sqlx::query_as::<_, CourseRow>(
            r#"
                INSERT INTO courses (
                    title, description, price_cents, image_url, level, duration,
                    subject_id, instructor_id, featured, best_seller, is_new,
                    grade_level, published_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                RETURNING *
            "#,
        )
        .bind(course.title)
        .bind(course.description)
        .bind(course.price.cents())
        .bind(course.image_url)
        .bind(course.level)
        .bind(course.duration)
        .bind(course.subject_id)
        .bind(course.instructor_id)
        .bind(course.featured)
        .bind(course.best_seller)
        .bind(course.is_new)
        .bind(course.grade_level)
        .bind(course.published_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("course"))?;

        Ok(row.into())
    }

    async fn update_course(
        &self,
        id: i64,
        update: CourseUpdate,
    ) -> Result<Option<Course>, StoreError> {
        let row = sqlx::query_as::<_, CourseRow>(
            r#"
                UPDATE courses
                SET title = $2, description = $3, price_cents = $4, image_url = $5,
                    level = $6, duration = $7, featured = $8, best_seller = $9,
                    is_new = $10, grade_level = $11, published_at = $12, updated_at = now()
                WHERE id = $1
                RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.title)
        .bind(update.description)
        .bind(update.price.cents())
        .bind(update.image_url)
        .bind(update.level)
        .bind(update.duration)
        .bind(update.featured)
        .bind(update.best_seller)
        .bind(update.is_new)
        .bind(update.grade_level)
        .bind(update.published_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("course"))?;

        Ok(row.map(Course::from))
    }

    async fn course_modules(&self, course_id: i64) -> Result<Vec<Module>, StoreError> {
        let found = sqlx::query_as::<_, ModuleRow>(
            "SELECT * FROM modules WHERE course_id = $1 ORDER BY order_index",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("module"))?;

        Ok(found.into_iter().map(Module::from).collect())
    }

    async fn find_module(&self, id: i64) -> Result<Option<Module>, StoreError> {
        let found = sqlx::query_as::<_, ModuleRow>("SELECT * FROM modules WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("module"))?;

        Ok(found.map(Module::from))
    }

    async fn create_module(&self, module: NewModule) -> Result<Module, StoreError> {
        let row = sqlx::query_as::<_, ModuleRow>(
            r#"
                INSERT INTO modules (title, description, order_index, course_id)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            "#,
        )
        .bind(module.title)
        .bind(module.description)
        .bind(module.order_index)
        .bind(module.course_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("module"))?;

        Ok(row.into())
    }

    async fn module_lessons(&self, module_ids: &[i64]) -> Result<Vec<Lesson>, StoreError> {
        if module_ids.is_empty() {
            return Ok(Vec::new());
        }

        let found = sqlx::query_as::<_, LessonRow>(
            "SELECT * FROM lessons WHERE module_id = ANY($1) ORDER BY module_id, order_index",
        )
        .bind(module_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("lesson"))?;

        Ok(found.into_iter().map(Lesson::from).collect())
    }

    async fn find_lesson(&self, id: i64) -> Result<Option<Lesson>, StoreError> {
        let found = sqlx::query_as::<_, LessonRow>("SELECT * FROM lessons WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("lesson"))?;

        Ok(found.map(Lesson::from))
    }

    async fn create_lesson(&self, lesson: NewLesson) -> Result<Lesson, StoreError> {
        let row = sqlx::query_as::<_, LessonRow>(
            r#"
                INSERT INTO lessons (
                    title, description, content, video_url, duration, order_index, module_id
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
            "#,
        )
        .bind(lesson.title)
        .bind(lesson.description)
        .bind(lesson.content)
        .bind(lesson.video_url)
        .bind(lesson.duration)
        .bind(lesson.order_index)
        .bind(lesson.module_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("lesson"))?;

        Ok(row.into())
    }

    async fn rating_stats(&self, course_ids: &[i64]) -> Result<Vec<RatingStats>, StoreError> {
        if course_ids.is_empty() {
            return Ok(Vec::new());
        }

        let found = sqlx::query_as::<_, RatingRow>(
            r#"
                SELECT course_id, AVG(rating)::float8 AS average, COUNT(*) AS count
                FROM reviews
                WHERE course_id = ANY($1)
                GROUP BY course_id
            "#,
        )
        .bind(course_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("review"))?;

        Ok(found.into_iter().map(RatingStats::from).collect())
    }

    async fn course_reviews(&self, course_id: i64) -> Result<Vec<Review>, StoreError> {
        let found = sqlx::query_as::<_, ReviewRow>(
            "SELECT * FROM reviews WHERE course_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("review"))?;

        Ok(found.into_iter().map(Review::from).collect())
    }
}
