use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{
    course::Course,
    instructor::{RecentEnrollment, RecentReview},
    money::Money,
    subject::Subject,
};

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct InstructorCourse {
    #[serde(flatten)]
    pub course: Course,
    pub subject: Option<Subject>,
    pub total_enrollments: i64,
    pub average_rating: Option<f64>,
    pub review_count: i64,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Enrollment,
    Review,
}

#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum ActivityData {
    Enrollment(RecentEnrollment),
    Review(RecentReview),
}

#[derive(Serialize, Debug)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub title: String,
    pub time: DateTime<Utc>,
    pub data: ActivityData,
}

impl From<RecentEnrollment> for Activity {
    fn from(enrollment: RecentEnrollment) -> Self {
        Self {
            kind: ActivityKind::Enrollment,
            title: format!("New enrollment in \"{}\"", enrollment.course_title),
            time: enrollment.enrolled_at,
            data: ActivityData::Enrollment(enrollment),
        }
    }
}

impl From<RecentReview> for Activity {
    fn from(review: RecentReview) -> Self {
        Self {
            kind: ActivityKind::Review,
            title: format!(
                "New {}-star review for \"{}\"",
                review.rating, review.course_title
            ),
            time: review.created_at,
            data: ActivityData::Review(review),
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct InstructorStats {
    pub total_students: i64,
    pub total_revenue: Money,
    pub average_rating: f64,
    pub recent_activities: Vec<Activity>,
}
