use tracing::{error, info};

use crate::{
    errors::AppError,
    models::user::{NewUser, Role, User},
    schema::auth::{LoginRequest, RegisterRequest},
    store::{Store, StoreError},
    utils::{hash_password, verify_password},
};

const DUPLICATE_USER: &str = "User with this email or username already exists";
const INVALID_CREDENTIALS: &str = "Invalid credentials";

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn register(store: &dyn Store, form: RegisterRequest) -> Result<User, AppError> {
    form.validate()?;

    let email = normalize_email(&form.email);
    let username = form.username.trim().to_string();

    if store.user_exists(&email, &username).await? {
        return Err(AppError::conflict(DUPLICATE_USER));
    }

    let password = hash_password(&form.password).map_err(|e| {
        error!(error = %e, "password hashing failed");
        AppError::InternalError
    })?;

    let user = store
        .create_user(NewUser {
            username,
            password,
            email,
            full_name: form.full_name.trim().to_string(),
            avatar: form.avatar,
            bio: form.bio,
            role: form.role.unwrap_or(Role::Student),
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => AppError::conflict(DUPLICATE_USER),
            other => other.into(),
        })?;

    info!(user_id = user.id, role = %user.role, "user registered");
    Ok(user)
}

pub async fn login(store: &dyn Store, credentials: LoginRequest) -> Result<User, AppError> {
    let (Some(email), Some(password)) = (credentials.email, credentials.password) else {
        return Err(AppError::validation("Email and password are required"));
    };
    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::validation("Email and password are required"));
    }

    let user = store
        .find_user_by_email(&normalize_email(&email))
        .await?
        .ok_or_else(|| AppError::unauthorized(INVALID_CREDENTIALS))?;

    verify_password(&password, &user.password)
        .map_err(|_| AppError::unauthorized(INVALID_CREDENTIALS))?;

    info!(user_id = user.id, "user logged in");
    Ok(user)
}

pub async fn profile(store: &dyn Store, user_id: i64) -> Result<User, AppError> {
    store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}
