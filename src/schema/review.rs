use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateReview {
    pub course_id: i64,
    pub rating: i32,
    pub comment: Option<String>,
}

impl CreateReview {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(1..=5).contains(&self.rating) {
            return Err(AppError::validation("Rating must be between 1 and 5"));
        }
        Ok(())
    }
}
