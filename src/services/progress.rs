use chrono::Utc;
use tracing::info;

use crate::{
    errors::AppError,
    models::{
        enrollment::{LessonCounts, ProgressUpdate},
        progress::{LessonProgress, ProgressPatch},
    },
    schema::enrollment::{ProgressReport, ProgressView},
    store::Store,
};

pub const NOT_ENROLLED: &str = "You must be enrolled in this course to track progress";

/// `round(100 * completed / total)`, half rounding up, and 0 for a course
/// without lessons. Used by both the write path and the enrollment listing.
pub fn progress_percentage(counts: LessonCounts) -> i32 {
    if counts.total <= 0 {
        return 0;
    }
    let completed = counts.completed.clamp(0, counts.total);
    ((200 * completed + counts.total) / (2 * counts.total)) as i32
}

/// Records a lesson report and, when the lesson is being marked complete,
/// recomputes the course progress of the owning enrollment.
pub async fn report(
    store: &dyn Store,
    user_id: i64,
    report: ProgressReport,
) -> Result<LessonProgress, AppError> {
    if report.last_position.is_some_and(|p| p < 0) {
        return Err(AppError::validation("lastPosition cannot be negative"));
    }

    let lesson = store
        .find_lesson(report.lesson_id)
        .await?
        .ok_or_else(|| AppError::not_found("Lesson not found"))?;
    let module = store
        .find_module(lesson.module_id)
        .await?
        .ok_or_else(|| AppError::not_found("Lesson not found"))?;
    let course_id = module.course_id;

    let enrollment = store
        .find_enrollment(user_id, course_id)
        .await?
        .ok_or_else(|| AppError::forbidden(NOT_ENROLLED))?;

    let progress = store
        .upsert_progress(
            user_id,
            lesson.id,
            ProgressPatch {
                completed: report.completed,
                last_position: report.last_position,
            },
        )
        .await?;

    // un-marking a lesson leaves the course percentage untouched
    if report.completed == Some(true) {
        let counts = store.lesson_counts(user_id, course_id).await?;
        let percentage = progress_percentage(counts);
        let finished = percentage == 100;

        store
            .update_progress(
                user_id,
                course_id,
                ProgressUpdate {
                    progress: percentage,
                    completed: finished,
                    completed_at: finished
                        .then(|| enrollment.completed_at.unwrap_or_else(Utc::now)),
                },
            )
            .await?;

        info!(
            user_id,
            course_id,
            progress = percentage,
            completed = finished,
            "course progress recomputed"
        );
    }

    Ok(progress)
}

pub async fn lesson_progress(
    store: &dyn Store,
    user_id: i64,
    lesson_id: i64,
) -> Result<ProgressView, AppError> {
    Ok(match store.find_progress(user_id, lesson_id).await? {
        Some(progress) => ProgressView::Tracked(progress),
        None => ProgressView::untracked(user_id, lesson_id),
    })
}
