use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Ratings, SubjectSummary, UserSummary};
use crate::{
    errors::AppError,
    models::{
        course::{
            Course, CourseFilter, CourseUpdate, Lesson, Module, NewCourse, NewLesson, NewModule,
            PageWindow,
        },
        money::Money,
        review::Review,
        subject::Subject,
    },
};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 12;
const MAX_LIMIT: i64 = 100;
const ALL: &str = "all";

/// Query string of `GET /courses`. `language` is the historical name of
/// `subject`; both are accepted.
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct CourseQuery {
    pub language: Option<String>,
    pub subject: Option<String>,
    pub level: Option<String>,
    pub search: Option<String>,
    pub featured: Option<bool>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn window(self) -> PageWindow {
        PageWindow {
            offset: (self.page - 1).saturating_mul(self.limit),
            limit: self.limit,
        }
    }

    pub fn total_pages(self, total: i64) -> i64 {
        (total + self.limit - 1) / self.limit
    }
}

impl CourseQuery {
    pub fn into_parts(self) -> Result<(CourseFilter, PageRequest), AppError> {
        let page = self.page.unwrap_or(DEFAULT_PAGE);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);

        if page < 1 {
            return Err(AppError::validation("page must be at least 1"));
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(AppError::validation(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }

        let subject_id = match specified(self.language.or(self.subject)) {
            Some(raw) => Some(
                raw.parse::<i64>()
                    .map_err(|_| AppError::validation("language must be a subject id or `all`"))?,
            ),
            None => None,
        };

        let filter = CourseFilter {
            subject_id,
            level: specified(self.level),
            search: self
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            featured: self.featured.unwrap_or(false),
        };

        Ok((filter, PageRequest { page, limit }))
    }
}

fn specified(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(ALL))
}

#[derive(Serialize, Debug)]
pub struct CourseCard {
    #[serde(flatten)]
    pub course: Course,
    pub instructor: Option<UserSummary>,
    pub subject: Option<SubjectSummary>,
    pub ratings: Ratings,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total_courses: i64,
    pub total_pages: i64,
}

#[derive(Serialize, Debug)]
pub struct CoursePage {
    pub courses: Vec<CourseCard>,
    pub pagination: Pagination,
}

#[derive(Serialize, Debug)]
pub struct ModuleWithLessons {
    #[serde(flatten)]
    pub module: Module,
    pub lessons: Vec<Lesson>,
}

#[derive(Serialize, Debug)]
pub struct ReviewWithUser {
    #[serde(flatten)]
    pub review: Review,
    pub user: Option<UserSummary>,
}

#[derive(Serialize, Debug)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub subject: Option<Subject>,
    pub instructor: Option<UserSummary>,
    pub modules: Vec<ModuleWithLessons>,
    pub ratings: Ratings,
    pub reviews: Vec<ReviewWithUser>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CourseForm {
    pub title: String,
    pub description: String,
    pub price: Money,
    pub image_url: Option<String>,
    pub level: String,
    pub duration: i32,
    #[serde(alias = "languageId")]
    pub subject_id: i64,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub best_seller: bool,
    #[serde(default)]
    pub is_new: bool,
    pub grade_level: Option<String>,
}

impl CourseForm {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().chars().count() < 5 {
            return Err(AppError::validation("Title must be at least 5 characters"));
        }
        if self.description.trim().chars().count() < 20 {
            return Err(AppError::validation("Description must be at least 20 characters"));
        }
        if !self.price.is_positive() {
            return Err(AppError::validation("Price must be positive"));
        }
        if self.duration <= 0 {
            return Err(AppError::validation("Duration must be positive"));
        }
        if self.level.trim().is_empty() {
            return Err(AppError::validation("Level is required"));
        }
        Ok(())
    }

    pub fn into_new(self, instructor_id: i64, published_at: DateTime<Utc>) -> NewCourse {
        NewCourse {
            title: self.title,
            description: self.description,
            price: self.price,
            image_url: self.image_url,
            level: self.level,
            duration: self.duration,
            subject_id: self.subject_id,
            instructor_id,
            featured: self.featured,
            best_seller: self.best_seller,
            is_new: self.is_new,
            grade_level: self.grade_level,
            published_at: Some(published_at),
        }
    }

    pub fn into_update(self, published_at: Option<DateTime<Utc>>) -> CourseUpdate {
        CourseUpdate {
            title: self.title,
            description: self.description,
            price: self.price,
            image_url: self.image_url,
            level: self.level,
            duration: self.duration,
            featured: self.featured,
            best_seller: self.best_seller,
            is_new: self.is_new,
            grade_level: self.grade_level,
            published_at,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ModuleForm {
    pub title: String,
    pub description: Option<String>,
    pub order_index: i32,
}

impl ModuleForm {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_outline_entry(&self.title, self.order_index)
    }

    pub fn into_new(self, course_id: i64) -> NewModule {
        NewModule {
            title: self.title,
            description: self.description,
            order_index: self.order_index,
            course_id,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LessonForm {
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub duration: Option<i32>,
    pub order_index: i32,
}

impl LessonForm {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_outline_entry(&self.title, self.order_index)?;
        if self.duration.is_some_and(|d| d < 0) {
            return Err(AppError::validation("Duration cannot be negative"));
        }
        Ok(())
    }

    pub fn into_new(self, module_id: i64) -> NewLesson {
        NewLesson {
            title: self.title,
            description: self.description,
            content: self.content,
            video_url: self.video_url,
            duration: self.duration,
            order_index: self.order_index,
            module_id,
        }
    }
}

fn validate_outline_entry(title: &str, order_index: i32) -> Result<(), AppError> {
    if title.trim().chars().count() < 3 {
        return Err(AppError::validation("Title must be at least 3 characters"));
    }
    if order_index < 0 {
        return Err(AppError::validation("Order index cannot be negative"));
    }
    Ok(())
}
