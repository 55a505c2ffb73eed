use axum::response::Response;
use serde::Serialize;

use crate::utils::response::success;

pub mod account;
pub mod event_form;
pub mod events;
pub mod registrations;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

#[derive(Serialize)]
struct InfoPage {
    title: &'static str,
    body: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "gatherly-api",
    };

    success(payload, "Health check successful")
}

pub async fn about() -> Response {
    success(
        InfoPage {
            title: "About",
            body: "Browse curated events, publish your own and register for the ones you want to attend.",
        },
        "About",
    )
}

pub async fn contact() -> Response {
    success(
        InfoPage {
            title: "Contact",
            body: "Questions about an event? Reach its organizer through the event page.",
        },
        "Contact",
    )
}
