use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::feed::visibility::EventScope;

pub const DEFAULT_CATEGORY: &str = "General";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub location: String,
    pub date: DateTime<Utc>,
    pub description: String,
    pub category: String,
    pub image_url: Option<String>,
    pub organizer_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated content of the event form, used for both creation and edits.
#[derive(Debug, Clone)]
pub struct EventDetails {
    pub title: String,
    pub location: String,
    pub date: DateTime<Utc>,
    pub description: String,
    pub category: String,
    pub image_url: String,
    pub organizer_name: String,
}

/// Optional narrowing applied on top of the visibility scope.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl Event {
    pub async fn create(
        pool: &SqlitePool,
        owner: Uuid,
        details: EventDetails,
    ) -> Result<Event, sqlx::Error> {
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            user_id: owner,
            title: details.title,
            location: details.location,
            date: details.date,
            description: details.description,
            category: details.category,
            image_url: Some(details.image_url),
            organizer_name: Some(details.organizer_name),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO events \
             (id, user_id, title, location, date, description, category, image_url, \
              organizer_name, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(event.id)
        .bind(event.user_id)
        .bind(&event.title)
        .bind(&event.location)
        .bind(event.date)
        .bind(&event.description)
        .bind(&event.category)
        .bind(&event.image_url)
        .bind(&event.organizer_name)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(pool)
        .await?;

        Ok(event)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Event>, sqlx::Error> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(pool)
            .await
    }

    /// Events the scope admits, oldest date first, narrowed by `filter`.
    pub async fn list_visible(
        pool: &SqlitePool,
        scope: &EventScope,
        filter: &EventFilter,
    ) -> Result<Vec<Event>, sqlx::Error> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM events WHERE user_id IN (");
        let mut owners = query.separated(", ");
        for owner in scope.owner_ids() {
            owners.push_bind(owner);
        }
        query.push(")");

        if let Some(category) = filter.category.as_deref() {
            query.push(" AND category = ").push_bind(category.to_string());
        }
        if let Some(search) = filter.search.as_deref() {
            let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
            query
                .push(" AND (LOWER(title) LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR LOWER(location) LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR LOWER(category) LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
        query.push(" ORDER BY date ASC");

        query.build_query_as::<Event>().fetch_all(pool).await
    }

    pub async fn list_by_owner(pool: &SqlitePool, owner: Uuid) -> Result<Vec<Event>, sqlx::Error> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE user_id = ? ORDER BY date ASC")
            .bind(owner)
            .fetch_all(pool)
            .await
    }

    /// Events the user holds a registration for, in registration order.
    pub async fn list_joined_by(pool: &SqlitePool, user: Uuid) -> Result<Vec<Event>, sqlx::Error> {
        sqlx::query_as::<_, Event>(
            "SELECT e.* FROM events e \
             JOIN registrations r ON r.event_id = e.id \
             WHERE r.user_id = ? \
             ORDER BY r.created_at ASC",
        )
        .bind(user)
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        details: EventDetails,
    ) -> Result<Option<Event>, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE events SET title = ?, location = ?, date = ?, description = ?, \
             category = ?, image_url = ?, organizer_name = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&details.title)
        .bind(&details.location)
        .bind(details.date)
        .bind(&details.description)
        .bind(&details.category)
        .bind(&details.image_url)
        .bind(&details.organizer_name)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Self::find_by_id(pool, id).await
    }

    /// Deletes the event and its registrations in one transaction.
    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM registrations WHERE event_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let removed = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(removed == 1)
    }

    pub fn is_owned_by(&self, user: Uuid) -> bool {
        self.user_id == user
    }
}

/// Escapes `LIKE` wildcards so a search term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
