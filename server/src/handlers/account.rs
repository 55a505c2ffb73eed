use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::auth::extract::session_token;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::session::{clear_session_cookie, session_cookie};
use crate::auth::{CurrentUser, MaybeUser};
use crate::models::user::is_unique_violation;
use crate::models::{Event, NewUser, User};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::ApiJson;
use crate::utils::response::{created, empty_success, success};

const MAX_USERNAME_LEN: usize = 20;
const MAX_EMAIL_LEN: usize = 120;

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm: String,
}

#[derive(Serialize)]
struct FormDescriptor {
    fields: &'static [&'static str],
    signed_in_as: Option<String>,
}

#[derive(Serialize)]
struct Dashboard {
    user: User,
    my_events: Vec<Event>,
    joined_events: Vec<Event>,
}

pub async fn login_form(user: MaybeUser) -> Response {
    success(
        FormDescriptor {
            fields: &["email", "password"],
            signed_in_as: user.0.map(|u| u.username),
        },
        "Login form",
    )
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginInput>,
) -> Result<Response, AppError> {
    let email = input.email.trim().to_string();
    let failed = || AppError::LoginRejected {
        message: "Login failed: check your email and password".to_string(),
        input: json!({ "email": email }),
    };

    if email.is_empty() || input.password.is_empty() {
        return Err(failed());
    }

    let Some(user) = User::find_by_email(&state.pool, &email).await? else {
        return Err(failed());
    };

    let hash = user.password_hash.clone();
    let password = input.password;
    let matches = tokio::task::spawn_blocking(move || verify_password(&hash, &password)).await?;
    if !matches {
        return Err(failed());
    }

    let token = state
        .sessions
        .create(user.id)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    let cookie = session_cookie(&token, state.sessions.ttl(), state.config.production);

    info!(user_id = %user.id, "User logged in");
    Ok(([(SET_COOKIE, cookie)], success(user, "Logged in")).into_response())
}

pub async fn register_form(user: MaybeUser) -> Response {
    success(
        FormDescriptor {
            fields: &["username", "email", "password", "confirm"],
            signed_in_as: user.0.map(|u| u.username),
        },
        "Sign-up form",
    )
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<SignupInput>,
) -> Result<Response, AppError> {
    let username = input.username.trim().to_string();
    let email = input.email.trim().to_string();
    let reject = |message: &str| AppError::FormRejected {
        message: message.to_string(),
        input: json!({ "username": username, "email": email }),
    };

    if username.is_empty() || email.is_empty() || input.password.is_empty() {
        return Err(reject("Username, email and password are required"));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(reject("Username must be at most 20 characters"));
    }
    if email.chars().count() > MAX_EMAIL_LEN || !is_plausible_email(&email) {
        return Err(reject("Email address is not valid"));
    }
    if input.password != input.confirm {
        return Err(reject("Passwords must match"));
    }

    let password = input.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await?
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let new_user = NewUser {
        username: username.clone(),
        email: email.clone(),
        password_hash,
    };
    let user = match User::create(&state.pool, new_user).await {
        Ok(user) => user,
        Err(e) if is_unique_violation(&e) => {
            return Err(reject("Username or email is already taken"));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user.id, username = %user.username, "User registered");
    Ok(created(user, "Account created, please log in"))
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.sessions.revoke(&token);
    }
    ([(SET_COOKIE, clear_session_cookie())], empty_success("Logged out")).into_response()
}

pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    let my_events = Event::list_by_owner(&state.pool, user.id).await?;
    let joined_events = Event::list_joined_by(&state.pool, user.id).await?;

    Ok(success(
        Dashboard {
            user,
            my_events,
            joined_events,
        },
        "Dashboard",
    ))
}

/// `local@domain.tld` with no whitespace; deliverability is not our concern.
fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
