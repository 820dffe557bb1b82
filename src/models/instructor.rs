use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentEnrollment {
    pub enrollment_id: i64,
    pub enrolled_at: DateTime<Utc>,
    pub course_id: i64,
    pub course_title: String,
    pub user_id: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentReview {
    pub review_id: i64,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub course_id: i64,
    pub course_title: String,
    pub user_id: i64,
    pub user_name: String,
}
