use serde::{Deserialize, Serialize};

use super::{SubjectSummary, UserSummary};
use crate::{
    errors::AppError,
    models::{course::Course, enrollment::Enrollment, money::Money, progress::LessonProgress},
};

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateEnrollment {
    pub course_id: i64,
    pub payment_id: Option<String>,
    pub payment_amount: Option<Money>,
}

impl CreateEnrollment {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.payment_amount.is_some_and(|amount| amount.cents() < 0) {
            return Err(AppError::validation("Payment amount cannot be negative"));
        }
        Ok(())
    }

    /// A zero amount is treated as absent and falls back to the list price.
    pub fn amount_or(&self, list_price: Money) -> Money {
        self.payment_amount
            .filter(|amount| amount.is_positive())
            .unwrap_or(list_price)
    }
}

#[derive(Serialize, Debug)]
pub struct EnrolledCourse {
    #[serde(flatten)]
    pub course: Course,
    pub subject: Option<SubjectSummary>,
    pub instructor: Option<UserSummary>,
}

/// An enrollment with progress recomputed from lesson records.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentView {
    #[serde(flatten)]
    pub enrollment: Enrollment,
    pub course: Option<EnrolledCourse>,
    pub total_lessons: i64,
    pub completed_lessons: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub lesson_id: i64,
    pub completed: Option<bool>,
    pub last_position: Option<i32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UntrackedLesson {
    pub user_id: i64,
    pub lesson_id: i64,
    pub completed: bool,
    pub last_position: i32,
}

#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum ProgressView {
    Tracked(LessonProgress),
    Untracked(UntrackedLesson),
}

impl ProgressView {
    pub fn untracked(user_id: i64, lesson_id: i64) -> Self {
        ProgressView::Untracked(UntrackedLesson {
            user_id,
            lesson_id,
            completed: false,
            last_position: 0,
        })
    }
}
