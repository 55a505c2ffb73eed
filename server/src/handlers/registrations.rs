use axum::extract::State;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::handlers::events::{find_event, owned_event};
use crate::models::registration::MAX_SHORT_INFO_LEN;
use crate::models::{Event, Registrant, Registration};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{ApiJson, ApiPath};
use crate::utils::response::success;

#[derive(Debug, Deserialize)]
pub struct RegistrationInput {
    #[serde(default)]
    pub short_info: String,
}

#[derive(Serialize)]
struct RegistrationOutcome {
    created: bool,
    registration: Option<Registration>,
}

#[derive(Serialize)]
struct RegistrantList {
    event: Event,
    registrations: Vec<Registrant>,
}

/// Registering again for the same event leaves the first registration as
/// it was.
pub async fn register_for_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(event_id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<RegistrationInput>,
) -> Result<Response, AppError> {
    let event = find_event(&state, event_id).await?;

    let short_info = input.short_info.trim();
    if short_info.is_empty() {
        return Err(AppError::FormRejected {
            message: "Please add a short introduction before registering".to_string(),
            input: json!({ "short_info": input.short_info }),
        });
    }
    if short_info.chars().count() > MAX_SHORT_INFO_LEN {
        return Err(AppError::FormRejected {
            message: format!("Introduction must be at most {} characters", MAX_SHORT_INFO_LEN),
            input: json!({ "short_info": input.short_info }),
        });
    }

    let created = Registration::create_once(&state.pool, user.id, event.id, short_info).await?;
    let message = if created {
        info!(event_id = %event.id, user_id = %user.id, "Registration recorded");
        "Registration recorded"
    } else {
        "Already registered for this event"
    };

    let registration = Registration::find(&state.pool, user.id, event.id).await?;

    Ok(success(
        RegistrationOutcome {
            created,
            registration,
        },
        message,
    ))
}

pub async fn list_registrations(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(event_id): ApiPath<Uuid>,
) -> Result<Response, AppError> {
    let event = owned_event(&state, &user, event_id).await?;
    let registrations = Registration::list_registrants(&state.pool, event.id).await?;

    Ok(success(RegistrantList { event, registrations }, "Registrations"))
}
