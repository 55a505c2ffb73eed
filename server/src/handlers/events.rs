use axum::extract::{Query, State};
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::{CurrentUser, MaybeUser};
use crate::feed::{prioritize, EventScope, RankedEvent};
use crate::handlers::event_form::{EventFormInput, EventFormSubmission};
use crate::models::{Event, EventFilter, Registration, User};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{ApiMultipart, ApiPath};
use crate::utils::response::{created, empty_success, success};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub q: Option<String>,
}

#[derive(Serialize)]
struct EventFeed {
    now: DateTime<Utc>,
    events: Vec<RankedEvent>,
}

#[derive(Serialize)]
struct EventPage {
    event: Event,
    is_registered: bool,
    is_owner: bool,
    registration_count: i64,
}

#[derive(Serialize)]
struct EventFormPage {
    event_id: Option<Uuid>,
    form: EventFormInput,
}

pub async fn index(State(state): State<AppState>, viewer: MaybeUser) -> Result<Response, AppError> {
    let feed = visible_feed(&state, &viewer, EventFilter::default()).await?;
    Ok(success(feed, "Events"))
}

pub async fn list_events(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Query(query): Query<ListQuery>,
) -> Result<Response, AppError> {
    let filter = EventFilter {
        category: non_blank(query.category),
        search: non_blank(query.q),
    };
    let feed = visible_feed(&state, &viewer, filter).await?;
    Ok(success(feed, "Events"))
}

async fn visible_feed(state: &AppState, viewer: &MaybeUser, filter: EventFilter) -> Result<EventFeed, AppError> {
    let scope = EventScope::new(state.admin_id, viewer.viewer());
    let events = Event::list_visible(&state.pool, &scope, &filter).await?;
    let now = Utc::now();
    Ok(EventFeed {
        now,
        events: prioritize(events, now),
    })
}

pub async fn event_details(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    ApiPath(event_id): ApiPath<Uuid>,
) -> Result<Response, AppError> {
    let event = find_event(&state, event_id).await?;

    let is_registered = match &user {
        Some(user) => Registration::find(&state.pool, user.id, event.id)
            .await?
            .is_some(),
        None => false,
    };
    let is_owner = user.as_ref().is_some_and(|u| event.is_owned_by(u.id));
    let registration_count = Registration::count_for_event(&state.pool, event.id).await?;

    Ok(success(
        EventPage {
            event,
            is_registered,
            is_owner,
            registration_count,
        },
        "Event details",
    ))
}

pub async fn create_form(CurrentUser(user): CurrentUser) -> Response {
    success(
        EventFormPage {
            event_id: None,
            form: EventFormInput::blank_for(&user.username),
        },
        "Create event",
    )
}

pub async fn create_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<Response, AppError> {
    let submission = EventFormSubmission::from_multipart(multipart).await?;
    let details = submission.into_details(&state.uploads, None).await?;
    let event = Event::create(&state.pool, user.id, details).await?;

    info!(event_id = %event.id, user_id = %user.id, "Event created");
    Ok(created(event, "Event created"))
}

pub async fn update_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(event_id): ApiPath<Uuid>,
) -> Result<Response, AppError> {
    let event = owned_event(&state, &user, event_id).await?;
    Ok(success(
        EventFormPage {
            event_id: Some(event.id),
            form: EventFormInput::from_event(&event, &user.username),
        },
        "Update event",
    ))
}

pub async fn update_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(event_id): ApiPath<Uuid>,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<Response, AppError> {
    let event = owned_event(&state, &user, event_id).await?;

    let submission = EventFormSubmission::from_multipart(multipart).await?;
    let details = submission
        .into_details(&state.uploads, event.image_url.as_deref())
        .await?;
    let updated = Event::update(&state.pool, event.id, details)
        .await?
        .ok_or_else(|| AppError::not_found("Event", event_id))?;

    info!(event_id = %updated.id, user_id = %user.id, "Event updated");
    Ok(success(updated, "Event updated"))
}

pub async fn delete_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(event_id): ApiPath<Uuid>,
) -> Result<Response, AppError> {
    let event = owned_event(&state, &user, event_id).await?;
    Event::delete(&state.pool, event.id).await?;

    info!(event_id = %event.id, user_id = %user.id, "Event deleted");
    Ok(empty_success("Event deleted"))
}

pub(crate) async fn find_event(state: &AppState, event_id: Uuid) -> Result<Event, AppError> {
    Event::find_by_id(&state.pool, event_id)
        .await?
        .ok_or_else(|| AppError::not_found("Event", event_id))
}

/// Loads an event the user is allowed to manage. Anyone but the creator
/// gets `Forbidden` and nothing is touched.
pub(crate) async fn owned_event(state: &AppState, user: &User, event_id: Uuid) -> Result<Event, AppError> {
    let event = find_event(state, event_id).await?;
    if !event.is_owned_by(user.id) {
        return Err(AppError::Forbidden(
            "Only the event's creator can manage it".to_string(),
        ));
    }
    Ok(event)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
