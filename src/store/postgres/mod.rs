//! sqlx-backed store over the schema in `migrations/`.

use sqlx::{migrate::MigrateError, Pool, Postgres};

use super::StoreError;

mod catalog;
mod enrollments;
mod instructor;
mod reviews;
mod rows;
mod users;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// Translate constraint violations into typed store errors.
fn db_error(entity: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |err| match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(entity),
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            StoreError::MissingReference(entity)
        }
        _ => StoreError::Database(err.to_string()),
    }
}

/// Escape `%`, `_` and `\` so user input is matched literally by `ILIKE`.
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
