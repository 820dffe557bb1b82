//! Instructor dashboard and course authoring. Every function takes the
//! [`Instructor`] capability, so role checks happen once in the guard.

use chrono::Utc;
use tracing::info;

use crate::{
    errors::AppError,
    models::{
        course::{Course, Lesson, Module},
        user::Instructor,
    },
    schema::{
        course::{CourseForm, LessonForm, ModuleForm},
        instructor::{Activity, InstructorCourse, InstructorStats},
    },
    store::{Store, StoreError},
};

const RECENT_ENROLLMENTS: i64 = 10;
const RECENT_REVIEWS: i64 = 5;
const MAX_ACTIVITIES: usize = 10;
const NOT_OWNER: &str = "You can only modify your own courses";

fn one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub async fn courses(
    store: &dyn Store,
    instructor: Instructor,
) -> Result<Vec<InstructorCourse>, AppError> {
    let courses = store.instructor_courses(instructor.id).await?;
    let course_ids: Vec<i64> = courses.iter().map(|c| c.id).collect();
    let stats = store.rating_stats(&course_ids).await?;

    let mut result = Vec::with_capacity(courses.len());
    for course in courses {
        let rating = stats.iter().find(|s| s.course_id == course.id);
        result.push(InstructorCourse {
            subject: store.find_subject(course.subject_id).await?,
            total_enrollments: store.enrollment_count(course.id).await?,
            average_rating: rating.map(|r| one_decimal(r.average)),
            review_count: rating.map_or(0, |r| r.count),
            course,
        });
    }
    Ok(result)
}

pub async fn stats(store: &dyn Store, instructor: Instructor) -> Result<InstructorStats, AppError> {
    let enrollments = store
        .recent_enrollments(instructor.id, RECENT_ENROLLMENTS)
        .await?;
    let reviews = store.recent_reviews(instructor.id, RECENT_REVIEWS).await?;

    let mut recent_activities: Vec<Activity> = enrollments
        .into_iter()
        .map(Activity::from)
        .chain(reviews.into_iter().map(Activity::from))
        .collect();
    recent_activities.sort_by(|a, b| b.time.cmp(&a.time));
    recent_activities.truncate(MAX_ACTIVITIES);

    Ok(InstructorStats {
        total_students: store.student_count(instructor.id).await?,
        total_revenue: store.revenue(instructor.id).await?,
        average_rating: store
            .average_rating(instructor.id)
            .await?
            .map_or(0.0, one_decimal),
        recent_activities,
    })
}

async fn owned_course(
    store: &dyn Store,
    instructor: Instructor,
    course_id: i64,
) -> Result<Course, AppError> {
    let course = store
        .find_course(course_id)
        .await?
        .ok_or_else(|| AppError::not_found("Course not found"))?;

    if course.instructor_id != instructor.id {
        return Err(AppError::forbidden(NOT_OWNER));
    }
    Ok(course)
}

async fn require_subject(store: &dyn Store, subject_id: i64) -> Result<(), AppError> {
    store
        .find_subject(subject_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::not_found("Subject not found"))
}

pub async fn create_course(
    store: &dyn Store,
    instructor: Instructor,
    form: CourseForm,
) -> Result<Course, AppError> {
    form.validate()?;
    require_subject(store, form.subject_id).await?;

    let course = store
        .create_course(form.into_new(instructor.id, Utc::now()))
        .await?;
    info!(course_id = course.id, instructor_id = instructor.id, "course created");
    Ok(course)
}

/// Replaces the editable fields of an owned course. The subject and the
/// publication time are kept.
pub async fn update_course(
    store: &dyn Store,
    instructor: Instructor,
    course_id: i64,
    form: CourseForm,
) -> Result<Course, AppError> {
    form.validate()?;
    let existing = owned_course(store, instructor, course_id).await?;

    let course = store
        .update_course(existing.id, form.into_update(existing.published_at))
        .await?
        .ok_or_else(|| AppError::not_found("Course not found"))?;
    info!(course_id = course.id, instructor_id = instructor.id, "course updated");
    Ok(course)
}

pub async fn add_module(
    store: &dyn Store,
    instructor: Instructor,
    course_id: i64,
    form: ModuleForm,
) -> Result<Module, AppError> {
    form.validate()?;
    let course = owned_course(store, instructor, course_id).await?;

    store
        .create_module(form.into_new(course.id))
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => {
                AppError::conflict("A module with this order index already exists")
            }
            other => other.into(),
        })
}

pub async fn add_lesson(
    store: &dyn Store,
    instructor: Instructor,
    module_id: i64,
    form: LessonForm,
) -> Result<Lesson, AppError> {
    form.validate()?;
    let module = store
        .find_module(module_id)
        .await?
        .ok_or_else(|| AppError::not_found("Module not found"))?;
    owned_course(store, instructor, module.course_id).await?;

    store
        .create_lesson(form.into_new(module.id))
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => {
                AppError::conflict("A lesson with this order index already exists")
            }
            other => other.into(),
        })
}
