//! Demo content for a fresh installation.

use chrono::{Duration, DurationRound, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{Event, EventDetails};
use crate::utils::upload::PLACEHOLDER_IMAGE_URL;

/// Seeding is skipped once the store holds more events than this.
const SEEDED_THRESHOLD: i64 = 5;

/// (title, category, location, days from today)
const DEMO_EVENTS: [(&str, &str, &str, i64); 8] = [
    ("City Tech Expo", "Tech", "Convention Centre", 3),
    ("Lakeside Music Night", "Music", "Lakeside Stage", 6),
    ("Street Food Day", "Food", "Old Town Square", 12),
    ("Startup Pitch Evening", "Business", "Innovation Hub", 25),
    ("Morning Yoga Retreat", "Health", "Hilltop Park", 40),
    ("Community Marathon", "Sports", "City Centre", 75),
    ("Open Studio Art Walk", "Art", "Gallery District", -2),
    ("Cricket Finals", "Sports", "University Ground", -9),
];

/// Inserts the demo events for `admin_id` unless the store already has
/// content. Returns how many events were written.
pub async fn seed_demo_events(pool: &SqlitePool, admin_id: Uuid) -> Result<usize, sqlx::Error> {
    if Event::count(pool).await? > SEEDED_THRESHOLD {
        return Ok(0);
    }

    let today = Utc::now()
        .duration_trunc(Duration::days(1))
        .unwrap_or_else(|_| Utc::now());
    let at_six_pm = today + Duration::hours(18);

    for (title, category, location, offset_days) in DEMO_EVENTS {
        Event::create(
            pool,
            admin_id,
            EventDetails {
                title: title.to_string(),
                location: location.to_string(),
                date: at_six_pm + Duration::days(offset_days),
                description: format!("{title} - everyone is welcome."),
                category: category.to_string(),
                image_url: PLACEHOLDER_IMAGE_URL.to_string(),
                organizer_name: "Events Team".to_string(),
            },
        )
        .await?;
    }

    Ok(DEMO_EVENTS.len())
}
