use chrono::{DateTime, Utc};
use serde::Serialize;

use super::money::Money;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: Money,
    pub image_url: Option<String>,
    pub level: String,
    pub duration: i32,
    pub subject_id: i64,
    pub instructor_id: i64,
    pub featured: bool,
    pub best_seller: bool,
    pub is_new: bool,
    pub grade_level: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub price: Money,
    pub image_url: Option<String>,
    pub level: String,
    pub duration: i32,
    pub subject_id: i64,
    pub instructor_id: i64,
    pub featured: bool,
    pub best_seller: bool,
    pub is_new: bool,
    pub grade_level: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Editable course fields; the owning instructor and subject never change here.
#[derive(Debug, Clone)]
pub struct CourseUpdate {
    pub title: String,
    pub description: String,
    pub price: Money,
    pub image_url: Option<String>,
    pub level: String,
    pub duration: i32,
    pub featured: bool,
    pub best_seller: bool,
    pub is_new: bool,
    pub grade_level: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseFilter {
    pub subject_id: Option<i64>,
    pub level: Option<String>,
    pub search: Option<String>,
    pub featured: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingStats {
    pub course_id: i64,
    pub average: f64,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub order_index: i32,
    pub course_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewModule {
    pub title: String,
    pub description: Option<String>,
    pub order_index: i32,
    pub course_id: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub duration: Option<i32>,
    pub order_index: i32,
    pub module_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewLesson {
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub duration: Option<i32>,
    pub order_index: i32,
    pub module_id: i64,
}
