//! Shared fixtures for the HTTP and storage tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use gatherly_server::auth::password::hash_password;
use gatherly_server::config::Config;
use gatherly_server::models::{Event, EventDetails, NewUser, User};
use gatherly_server::routes::create_routes;
use gatherly_server::state::AppState;

pub const ADMIN_PASSWORD: &str = "admin-password";
pub const MULTIPART_BOUNDARY: &str = "----gatherly-test-boundary";

pub struct TestApp {
    pub state: AppState,
    pub admin: User,
    pub upload_dir: TempDir,
}

pub fn test_config(upload_dir: &TempDir) -> Config {
    let mut config = Config::for_database("sqlite::memory:");
    config.admin.password = Some(ADMIN_PASSWORD.to_string());
    config.upload_dir = upload_dir.path().join("uploads");
    config
}

impl TestApp {
    pub async fn new() -> Self {
        let upload_dir = tempfile::tempdir().unwrap();
        Self::with_config(test_config(&upload_dir), upload_dir).await
    }

    pub async fn with_config(config: Config, upload_dir: TempDir) -> Self {
        let state = AppState::bootstrap(config).await.unwrap();
        let admin = User::find_by_id(&state.pool, state.admin_id)
            .await
            .unwrap()
            .unwrap();
        Self {
            state,
            admin,
            upload_dir,
        }
    }

    pub fn router(&self) -> Router {
        create_routes(self.state.clone())
    }

    pub async fn create_user(&self, username: &str, password: &str) -> User {
        User::create(
            &self.state.pool,
            NewUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash: hash_password(password).unwrap(),
            },
        )
        .await
        .unwrap()
    }

    /// A user plus a cookie header value for a live session.
    pub async fn signed_in_user(&self, username: &str) -> (User, String) {
        let user = self.create_user(username, "secret-pass").await;
        let token = self.state.sessions.create(user.id).unwrap();
        (user, format!("session={token}"))
    }

    pub async fn create_event(&self, owner: Uuid, title: &str, date: DateTime<Utc>) -> Event {
        self.create_event_in(owner, title, "General", date).await
    }

    pub async fn create_event_in(
        &self,
        owner: Uuid,
        title: &str,
        category: &str,
        date: DateTime<Utc>,
    ) -> Event {
        Event::create(&self.state.pool, owner, details(title, category, date))
            .await
            .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse {
            status,
            headers,
            json,
            bytes: bytes.to_vec(),
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(&self, uri: &str, cookie: Option<&str>, body: Value) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn post_empty(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(
        &self,
        uri: &str,
        cookie: Option<&str>,
        fields: &[(&str, &str)],
        file: Option<(&str, &[u8])>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
            );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(multipart_body(fields, file))).unwrap())
            .await
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub json: Value,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    pub fn data(&self) -> &Value {
        &self.json["data"]
    }

    pub fn error_code(&self) -> &str {
        self.json["error"]["code"].as_str().unwrap_or_default()
    }

    pub fn event_titles(&self) -> Vec<String> {
        self.data()["events"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["title"].as_str().unwrap().to_string())
            .collect()
    }
}

pub fn details(title: &str, category: &str, date: DateTime<Utc>) -> EventDetails {
    EventDetails {
        title: title.to_string(),
        location: "Kathmandu".to_string(),
        date,
        description: format!("{title} description"),
        category: category.to_string(),
        image_url: "https://img.example/event.png".to_string(),
        organizer_name: "Organizer".to_string(),
    }
}

pub fn event_form_fields<'a>(title: &'a str, date: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("title", title),
        ("organizer_name", "Asha"),
        ("location", "Pokhara"),
        ("date", date),
        ("category", "Music"),
        ("image_url", ""),
        ("description", "Live music by the lake"),
    ]
}

pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"image_file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}
