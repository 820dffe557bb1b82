use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub image_url: Option<String>,
    pub grade_level: Option<String>,
    pub created_at: DateTime<Utc>,
}
