use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{about, account, contact, events, health_check, registrations};
use crate::state::AppState;
use crate::utils::upload::UPLOAD_URL_PREFIX;

pub fn create_routes(state: AppState) -> Router {
    let config = state.config.clone();

    // Only the event form carries files; everything else keeps axum's
    // default body limit.
    let event_forms = Router::new()
        .route(
            "/create-event",
            get(events::create_form).post(events::create_event),
        )
        .route(
            "/event/:id/update",
            get(events::update_form).post(events::update_event),
        )
        .layer(DefaultBodyLimit::max(config.max_upload_bytes));

    Router::new()
        .route("/", get(events::index))
        .route("/index", get(events::index))
        .route("/events", get(events::list_events))
        .route("/dashboard", get(account::dashboard))
        .route("/login", get(account::login_form).post(account::login))
        .route("/register", get(account::register_form).post(account::register))
        .route("/logout", get(account::logout))
        .route("/event/:id", get(events::event_details))
        .route("/event/:id/delete", post(events::delete_event))
        .route("/event/:id/register", post(registrations::register_for_event))
        .route(
            "/event/:id/registrations",
            get(registrations::list_registrations),
        )
        .route("/about", get(about))
        .route("/contact", get(contact))
        .route("/health", get(health_check))
        .merge(event_forms)
        .nest_service(UPLOAD_URL_PREFIX, ServeDir::new(&config.upload_dir))
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer(config.production))
        .layer(create_cors_layer(&config.allowed_origins))
        .with_state(state)
}
