use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    errors::AppError,
    models::user::{Role, User},
};

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub role: Option<Role>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.username.trim().chars().count() < 3 {
            return Err(AppError::validation("Username must be at least 3 characters"));
        }
        if !looks_like_email(&self.email) {
            return Err(AppError::validation("Please enter a valid email address"));
        }
        if self.password.chars().count() < 6 {
            return Err(AppError::validation("Password must be at least 6 characters"));
        }
        if self.full_name.trim().chars().count() < 2 {
            return Err(AppError::validation("Full name must be at least 2 characters"));
        }
        if self.role == Some(Role::Admin) {
            return Err(AppError::validation("Role must be student or instructor"));
        }
        Ok(())
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.trim().split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Both fields are optional so a missing one is a validation error rather
/// than a deserialization failure.
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: Option<String>,
    pub role: Role,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            avatar: user.avatar.clone(),
            role: user.role,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AuthResponse {
    pub user: PublicUser,
    pub token: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(flatten)]
    pub user: PublicUser,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for Profile {
    fn from(user: &User) -> Self {
        Self {
            user: PublicUser::from(user),
            bio: user.bio.clone(),
            created_at: user.created_at,
        }
    }
}
