use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::{
    models::{
        course::{Course, Lesson, Module, RatingStats},
        enrollment::Enrollment,
        instructor::{RecentEnrollment, RecentReview},
        money::Money,
        progress::LessonProgress,
        review::Review,
        subject::Subject,
        user::User,
    },
    store::StoreError,
};

#[derive(Debug, FromRow)]
pub(super) struct UserRow {
    id: i64,
    username: String,
    password: String,
    email: String,
    full_name: String,
    avatar: Option<String>,
    bio: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            username: row.username,
            password: row.password,
            email: row.email,
            full_name: row.full_name,
            avatar: row.avatar,
            bio: row.bio,
            role: row.role.parse().map_err(StoreError::Corrupt)?,
            created_at: row.created_at,
        })
    }
}

pub(super) fn users(rows: Vec<UserRow>) -> Result<Vec<User>, StoreError> {
    rows.into_iter().map(User::try_from).collect()
}

#[derive(Debug, FromRow)]
pub(super) struct SubjectRow {
    id: i64,
    name: String,
    code: String,
    image_url: Option<String>,
    grade_level: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<SubjectRow> for Subject {
    fn from(row: SubjectRow) -> Self {
        Subject {
            id: row.id,
            name: row.name,
            code: row.code,
            image_url: row.image_url,
            grade_level: row.grade_level,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct CourseRow {
    id: i64,
    title: String,
    description: String,
    price_cents: i64,
    image_url: Option<String>,
    level: String,
    duration: i32,
    subject_id: i64,
    instructor_id: i64,
    featured: bool,
    best_seller: bool,
    is_new: bool,
    grade_level: Option<String>,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<CourseRow> for Course {
    fn from(row: CourseRow) -> Self {
        Course {
            id: row.id,
            title: row.title,
            description: row.description,
            price: Money::from_cents(row.price_cents),
            image_url: row.image_url,
            level: row.level,
            duration: row.duration,
            subject_id: row.subject_id,
            instructor_id: row.instructor_id,
            featured: row.featured,
            best_seller: row.best_seller,
            is_new: row.is_new,
            grade_level: row.grade_level,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct ModuleRow {
    id: i64,
    title: String,
    description: Option<String>,
    order_index: i32,
    course_id: i64,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<ModuleRow> for Module {
    fn from(row: ModuleRow) -> Self {
        Module {
            id: row.id,
            title: row.title,
            description: row.description,
            order_index: row.order_index,
            course_id: row.course_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct LessonRow {
    id: i64,
    title: String,
    description: Option<String>,
    content: Option<String>,
    video_url: Option<String>,
    duration: Option<i32>,
    order_index: i32,
    module_id: i64,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<LessonRow> for Lesson {
    fn from(row: LessonRow) -> Self {
        Lesson {
            id: row.id,
            title: row.title,
            description: row.description,
            content: row.content,
            video_url: row.video_url,
            duration: row.duration,
            order_index: row.order_index,
            module_id: row.module_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct EnrollmentRow {
    id: i64,
    user_id: i64,
    course_id: i64,
    enrolled_at: DateTime<Utc>,
    completed: bool,
    completed_at: Option<DateTime<Utc>>,
    progress: i32,
    payment_status: String,
    payment_amount_cents: Option<i64>,
    payment_id: Option<String>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<EnrollmentRow> for Enrollment {
    type Error = StoreError;

    fn try_from(row: EnrollmentRow) -> Result<Self, Self::Error> {
        Ok(Enrollment {
            id: row.id,
            user_id: row.user_id,
            course_id: row.course_id,
            enrolled_at: row.enrolled_at,
            completed: row.completed,
            completed_at: row.completed_at,
            progress: row.progress,
            payment_status: row.payment_status.parse().map_err(StoreError::Corrupt)?,
            payment_amount: row.payment_amount_cents.map(Money::from_cents),
            payment_id: row.payment_id,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(super) struct ProgressRow {
    id: i64,
    user_id: i64,
    lesson_id: i64,
    completed: bool,
    last_position: i32,
    updated_at: DateTime<Utc>,
}

impl From<ProgressRow> for LessonProgress {
    fn from(row: ProgressRow) -> Self {
        LessonProgress {
            id: row.id,
            user_id: row.user_id,
            lesson_id: row.lesson_id,
            completed: row.completed,
            last_position: row.last_position,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct ReviewRow {
    id: i64,
    user_id: i64,
    course_id: i64,
    rating: i32,
    comment: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            id: row.id,
            user_id: row.user_id,
            course_id: row.course_id,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct RatingRow {
    course_id: i64,
    average: f64,
    count: i64,
}

impl From<RatingRow> for RatingStats {
    fn from(row: RatingRow) -> Self {
        RatingStats {
            course_id: row.course_id,
            average: row.average,
            count: row.count,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct RecentEnrollmentRow {
    enrollment_id: i64,
    enrolled_at: DateTime<Utc>,
    course_id: i64,
    course_title: String,
    user_id: i64,
}

impl From<RecentEnrollmentRow> for RecentEnrollment {
    fn from(row: RecentEnrollmentRow) -> Self {
        RecentEnrollment {
            enrollment_id: row.enrollment_id,
            enrolled_at: row.enrolled_at,
            course_id: row.course_id,
            course_title: row.course_title,
            user_id: row.user_id,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct RecentReviewRow {
    review_id: i64,
    rating: i32,
    comment: Option<String>,
    created_at: DateTime<Utc>,
    course_id: i64,
    course_title: String,
    user_id: i64,
    user_name: String,
}

impl From<RecentReviewRow> for RecentReview {
    fn from(row: RecentReviewRow) -> Self {
        RecentReview {
            review_id: row.review_id,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
            course_id: row.course_id,
            course_title: row.course_title,
            user_id: row.user_id,
            user_name: row.user_name,
        }
    }
}
