//! Persistence ports.
//!
//! Services talk to storage only through these traits. `PgStore` is the
//! production adapter; the in-memory adapter used by the test suite enforces
//! the same uniqueness rules as the SQL schema.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    course::{
        Course, CourseFilter, CourseUpdate, Lesson, Module, NewCourse, NewLesson, NewModule,
        PageWindow, RatingStats,
    },
    enrollment::{Enrollment, LessonCounts, NewEnrollment, PaidEnrollment, ProgressUpdate},
    instructor::{RecentEnrollment, RecentReview},
    money::Money,
    progress::{LessonProgress, ProgressPatch},
    review::{NewReview, Review},
    subject::Subject,
    user::{NewUser, User},
};

pub mod postgres;

#[cfg(test)]
pub mod memory;

pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("duplicate {0}")]
    Conflict(&'static str),
    /// A foreign key pointed at a missing row.
    #[error("missing {0}")]
    MissingReference(&'static str),
    #[error("database error: {0}")]
    Database(String),
    #[error("unreadable row: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// True when either the email or the username is already taken.
    async fn user_exists(&self, email: &str, username: &str) -> Result<bool, StoreError>;

    async fn users_by_ids(&self, ids: &[i64]) -> Result<Vec<User>, StoreError>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_subjects(&self) -> Result<Vec<Subject>, StoreError>;

    async fn subjects_by_ids(&self, ids: &[i64]) -> Result<Vec<Subject>, StoreError>;

    async fn find_subject(&self, id: i64) -> Result<Option<Subject>, StoreError>;

    /// Newest first.
    async fn list_courses(
        &self,
        filter: &CourseFilter,
        window: PageWindow,
    ) -> Result<Vec<Course>, StoreError>;

    async fn count_courses(&self, filter: &CourseFilter) -> Result<i64, StoreError>;

    async fn find_course(&self, id: i64) -> Result<Option<Course>, StoreError>;

    async fn create_course(&self, course: NewCourse) -> Result<Course, StoreError>;

    async fn update_course(
        &self,
        id: i64,
        update: CourseUpdate,
    ) -> Result<Option<Course>, StoreError>;

    /// Ordered by `order_index`.
    async fn course_modules(&self, course_id: i64) -> Result<Vec<Module>, StoreError>;

    async fn find_module(&self, id: i64) -> Result<Option<Module>, StoreError>;

    async fn create_module(&self, module: NewModule) -> Result<Module, StoreError>;

    /// Ordered by module, then `order_index`.
    async fn module_lessons(&self, module_ids: &[i64]) -> Result<Vec<Lesson>, StoreError>;

    async fn find_lesson(&self, id: i64) -> Result<Option<Lesson>, StoreError>;

    async fn create_lesson(&self, lesson: NewLesson) -> Result<Lesson, StoreError>;

    /// Courses without reviews are absent from the result.
    async fn rating_stats(&self, course_ids: &[i64]) -> Result<Vec<RatingStats>, StoreError>;

    /// Newest first.
    async fn course_reviews(&self, course_id: i64) -> Result<Vec<Review>, StoreError>;
}

#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    async fn find_enrollment(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> Result<Option<Enrollment>, StoreError>;

    /// Fails with [`StoreError::Conflict`] when the pair is already enrolled.
    async fn insert_enrollment(&self, enrollment: NewEnrollment)
        -> Result<Enrollment, StoreError>;

    /// Marks the (user, course) enrollment paid, creating it when missing.
    async fn upsert_paid_enrollment(
        &self,
        payment: PaidEnrollment,
    ) -> Result<Enrollment, StoreError>;

    /// Flags an existing enrollment whose payment has not completed as failed.
    async fn mark_payment_failed(
        &self,
        user_id: i64,
        course_id: i64,
        payment_id: &str,
    ) -> Result<Option<Enrollment>, StoreError>;

    async fn update_progress(
        &self,
        user_id: i64,
        course_id: i64,
        update: ProgressUpdate,
    ) -> Result<Option<Enrollment>, StoreError>;

    /// Newest enrollment first.
    async fn user_enrollments(&self, user_id: i64) -> Result<Vec<Enrollment>, StoreError>;

    async fn find_progress(
        &self,
        user_id: i64,
        lesson_id: i64,
    ) -> Result<Option<LessonProgress>, StoreError>;

    async fn upsert_progress(
        &self,
        user_id: i64,
        lesson_id: i64,
        patch: ProgressPatch,
    ) -> Result<LessonProgress, StoreError>;

    /// Lessons in the course and how many of them the user has completed.
    async fn lesson_counts(&self, user_id: i64, course_id: i64)
        -> Result<LessonCounts, StoreError>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Insert or overwrite the review keyed on (user, course).
    async fn upsert_review(&self, review: NewReview) -> Result<Review, StoreError>;
}

#[async_trait]
pub trait InstructorStore: Send + Sync {
    /// Newest first.
    async fn instructor_courses(&self, instructor_id: i64) -> Result<Vec<Course>, StoreError>;

    async fn enrollment_count(&self, course_id: i64) -> Result<i64, StoreError>;

    async fn student_count(&self, instructor_id: i64) -> Result<i64, StoreError>;

    /// Sum of amounts on completed enrollments across the instructor's courses.
    async fn revenue(&self, instructor_id: i64) -> Result<Money, StoreError>;

    async fn average_rating(&self, instructor_id: i64) -> Result<Option<f64>, StoreError>;

    async fn recent_enrollments(
        &self,
        instructor_id: i64,
        limit: i64,
    ) -> Result<Vec<RecentEnrollment>, StoreError>;

    async fn recent_reviews(
        &self,
        instructor_id: i64,
        limit: i64,
    ) -> Result<Vec<RecentReview>, StoreError>;
}

pub trait Store:
    UserStore + CatalogStore + EnrollmentStore + ReviewStore + InstructorStore
{
}

impl<T> Store for T where
    T: UserStore + CatalogStore + EnrollmentStore + ReviewStore + InstructorStore
{
}
