use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    pub id: i64,
    pub user_id: i64,
    pub lesson_id: i64,
    pub completed: bool,
    pub last_position: i32,
    pub updated_at: DateTime<Utc>,
}

/// Fields left as `None` keep their stored value (or the default on insert).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressPatch {
    pub completed: Option<bool>,
    pub last_position: Option<i32>,
}
