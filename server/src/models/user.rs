use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::config::AdminConfig;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("administrator account '{0}' does not exist and ADMIN_PASSWORD is not set")]
    MissingAdmin(String),

    #[error("failed to hash administrator password: {0}")]
    Hash(#[from] crate::auth::password::PasswordError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl User {
    pub async fn create(pool: &SqlitePool, new_user: NewUser) -> Result<User, sqlx::Error> {
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_username(
        pool: &SqlitePool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Removes a user together with everything hanging off it: their own
    /// registrations, the events they created and the registrations of
    /// those events. Returns `false` when no such user exists.
    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "DELETE FROM registrations \
             WHERE user_id = ? OR event_id IN (SELECT id FROM events WHERE user_id = ?)",
        )
        .bind(id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM events WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let removed = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(removed == 1)
    }

    /// Looks up the administrator account, creating it from the configured
    /// credentials when it is missing. Startup must not continue without it.
    pub async fn ensure_admin(pool: &SqlitePool, admin: &AdminConfig) -> Result<User, ProvisionError> {
        if let Some(existing) = Self::find_by_username(pool, &admin.username).await? {
            return Ok(existing);
        }

        let password = admin
            .password
            .clone()
            .ok_or_else(|| ProvisionError::MissingAdmin(admin.username.clone()))?;
        let password_hash = crate::auth::password::hash_password(&password)?;

        let user = Self::create(
            pool,
            NewUser {
                username: admin.username.clone(),
                email: admin.email.clone(),
                password_hash,
            },
        )
        .await?;

        tracing::info!(username = %user.username, user_id = %user.id, "Provisioned administrator account");
        Ok(user)
    }
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}
