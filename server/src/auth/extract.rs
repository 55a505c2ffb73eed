use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::auth::session::token_from_cookie_header;
use crate::feed::Viewer;
use crate::models::User;
use crate::state::AppState;
use crate::utils::error::AppError;

/// The signed-in user. Rejects with 401 when there is no live session.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// The signed-in user, if any.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    pub fn viewer(&self) -> Viewer {
        Viewer::from(self.0.as_ref().map(|u| u.id))
    }
}

/// Session token from the request's cookies, if one is present.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(token_from_cookie_header)
        .map(str::to_string)
}

async fn load_session_user(parts: &Parts, state: &AppState) -> Result<Option<User>, AppError> {
    let Some(token) = session_token(&parts.headers) else {
        return Ok(None);
    };
    let Some(user_id) = state.sessions.resolve(&token) else {
        return Ok(None);
    };

    let user = User::find_by_id(&state.pool, user_id).await?;
    if user.is_none() {
        // Account vanished under a live session.
        state.sessions.revoke(&token);
    }
    Ok(user)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        load_session_user(parts, state)
            .await?
            .map(CurrentUser)
            .ok_or_else(|| AppError::AuthError("Please log in to access this page".to_string()))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(load_session_user(parts, state).await?))
    }
}
