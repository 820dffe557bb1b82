use async_trait::async_trait;

use super::{db_error, rows, rows::UserRow, PgStore};
use crate::{
    models::user::{NewUser, User},
    store::{StoreError, UserStore},
};

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
                INSERT INTO users (username, password, email, full_name, avatar, bio, role)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
            "#,
        )
        .bind(user.username)
        .bind(user.password)
        .bind(user.email)
        .bind(user.full_name)
        .bind(user.avatar)
        .bind(user.bio)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("user"))?;

        row.try_into()
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("user"))?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("user"))?
            .map(User::try_from)
            .transpose()
    }

    async fn user_exists(&self, email: &str, username: &str) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 OR username = $2)",
        )
        .bind(email)
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("user"))
    }

    async fn users_by_ids(&self, ids: &[i64]) -> Result<Vec<User>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("user"))?;

        rows::users(found)
    }
}
