use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

pub const MAX_SHORT_INFO_LEN: usize = 280;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Registration {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub short_info: String,
    pub created_at: DateTime<Utc>,
}

/// A registration joined with the registrant's public profile, as shown to
/// the event owner.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Registrant {
    pub registration_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub short_info: String,
    pub created_at: DateTime<Utc>,
}

impl Registration {
    /// Records the registration unless the pair already has one. Returns
    /// whether a new row was written; the UNIQUE (user_id, event_id)
    /// constraint settles concurrent attempts.
    pub async fn create_once(
        pool: &SqlitePool,
        user_id: Uuid,
        event_id: Uuid,
        short_info: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO registrations (id, user_id, event_id, short_info, created_at) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT (user_id, event_id) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(event_id)
        .bind(short_info)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn find(
        pool: &SqlitePool,
        user_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<Registration>, sqlx::Error> {
        sqlx::query_as::<_, Registration>(
            "SELECT * FROM registrations WHERE user_id = ? AND event_id = ?",
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn count_for_event(pool: &SqlitePool, event_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM registrations WHERE event_id = ?")
            .bind(event_id)
            .fetch_one(pool)
            .await
    }

    /// Registrants of an event, newest first.
    pub async fn list_registrants(pool: &SqlitePool, event_id: Uuid) -> Result<Vec<Registrant>, sqlx::Error> {
        sqlx::query_as::<_, Registrant>(
            "SELECT r.id AS registration_id, r.user_id, u.username, u.email, \
                    r.short_info, r.created_at \
             FROM registrations r \
             JOIN users u ON u.id = r.user_id \
             WHERE r.event_id = ? \
             ORDER BY r.created_at DESC",
        )
        .bind(event_id)
        .fetch_all(pool)
        .await
    }
}
