pub mod biddb;
pub mod directorydb;
#[cfg(test)]
pub mod fixtures;
pub mod profiledb;
pub mod requirementdb;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::models::usermodel::User;

#[derive(Debug, Clone)]
pub struct DBClient {
    pub pool: Pool<Postgres>,
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }
}

pub(crate) const USER_COLUMNS: &str =
    "id, first_name, last_name, username, email, password, role, created_at, updated_at";

#[async_trait]
pub trait UserExt {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        username: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error>;

    async fn username_exists(&self, username: &str) -> Result<bool, sqlx::Error>;

    async fn is_token_revoked(&self, jti: Uuid) -> Result<bool, sqlx::Error>;

    async fn revoke_token(
        &self,
        jti: Uuid,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        username: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE id = $1",
                USER_COLUMNS
            ))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(username) = username {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE username = $1",
                USER_COLUMNS
            ))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        }

        Ok(user)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await
    }

    async fn is_token_revoked(&self, jti: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM token_blacklist WHERE jti = $1)")
            .bind(jti)
            .fetch_one(&self.pool)
            .await
    }

    async fn revoke_token(
        &self,
        jti: Uuid,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        let purged = sqlx::query("DELETE FROM token_blacklist WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?
            .rows_affected();
        if purged > 0 {
            tracing::debug!(purged, "expired revoked tokens removed");
        }

        sqlx::query(
            r#"
            INSERT INTO token_blacklist (jti, user_id, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(jti)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
