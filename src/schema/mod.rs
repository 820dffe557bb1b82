//! Request and response bodies.

use serde::{Deserialize, Serialize};

use crate::models::{subject::Subject, user::User};

pub mod auth;
pub mod course;
pub mod enrollment;
pub mod instructor;
pub mod payment;
pub mod review;

#[derive(Deserialize, Serialize, Debug)]
pub struct JWTClaims {
    pub sub: String,
    pub exp: usize,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

/// Public identity shown next to courses and reviews.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub full_name: String,
    pub avatar: Option<String>,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bio: Option<String>,
}

impl UserSummary {
    pub fn of(user: &User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            avatar: user.avatar.clone(),
            username: user.username.clone(),
            bio: None,
        }
    }

    pub fn with_bio(user: &User) -> Self {
        Self {
            bio: user.bio.clone(),
            ..Self::of(user)
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SubjectSummary {
    pub id: i64,
    pub name: String,
    pub code: String,
}

impl From<&Subject> for SubjectSummary {
    fn from(subject: &Subject) -> Self {
        Self {
            id: subject.id,
            name: subject.name.clone(),
            code: subject.code.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct Ratings {
    pub average: f64,
    pub count: i64,
}
