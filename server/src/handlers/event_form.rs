//! The event form shared by the create and update endpoints.
//!
//! The form arrives as `multipart/form-data` so it can carry an image file.
//! Validation failures return the text fields back to the client through
//! [`AppError::FormRejected`].

use axum::body::Bytes;
use axum::extract::Multipart;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::event::DEFAULT_CATEGORY;
use crate::models::{Event, EventDetails};
use crate::utils::error::AppError;
use crate::utils::upload::{UploadStore, PLACEHOLDER_IMAGE_URL};

pub const DATE_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";
const DATE_INPUT_FORMAT_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";

const MAX_TITLE_LEN: usize = 100;
const MAX_LOCATION_LEN: usize = 100;
const MAX_CATEGORY_LEN: usize = 50;
const MAX_ORGANIZER_LEN: usize = 100;
const MAX_IMAGE_URL_LEN: usize = 500;

/// Text fields of the event form, exactly as submitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventFormInput {
    pub title: String,
    pub organizer_name: String,
    pub location: String,
    pub date: String,
    pub category: String,
    pub image_url: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Bytes,
}

#[derive(Debug, Default)]
pub struct EventFormSubmission {
    pub input: EventFormInput,
    pub image: Option<ImageUpload>,
}

/// Form fields after validation, before the image is resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidEventForm {
    pub title: String,
    pub organizer_name: String,
    pub location: String,
    pub date: DateTime<Utc>,
    pub category: String,
    pub image_url: Option<String>,
    pub description: String,
}

impl EventFormInput {
    /// Prefill for a fresh form: the organizer defaults to the user's name.
    pub fn blank_for(username: &str) -> Self {
        Self {
            organizer_name: username.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            ..Self::default()
        }
    }

    /// Current values of an event, in form shape.
    pub fn from_event(event: &Event, owner_name: &str) -> Self {
        Self {
            title: event.title.clone(),
            organizer_name: event
                .organizer_name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| owner_name.to_string()),
            location: event.location.clone(),
            date: event.date.format(DATE_INPUT_FORMAT).to_string(),
            category: event.category.clone(),
            image_url: event.image_url.clone().unwrap_or_default(),
            description: event.description.clone(),
        }
    }

    pub fn validate(&self) -> Result<ValidEventForm, String> {
        let title = required("Title", &self.title, MAX_TITLE_LEN)?;
        let organizer_name = required("Organizer name", &self.organizer_name, MAX_ORGANIZER_LEN)?;
        let location = required("Location", &self.location, MAX_LOCATION_LEN)?;
        let category = required("Category", &self.category, MAX_CATEGORY_LEN)?;
        let description = required("Description", &self.description, usize::MAX)?;
        let raw_date = required("Date", &self.date, usize::MAX)?;
        let date = parse_event_date(&raw_date)
            .ok_or_else(|| format!("Date '{}' is not valid, use YYYY-MM-DDTHH:MM", raw_date))?;

        let image_url = self.image_url.trim();
        if image_url.chars().count() > MAX_IMAGE_URL_LEN {
            return Err(format!("Image URL must be at most {} characters", MAX_IMAGE_URL_LEN));
        }

        Ok(ValidEventForm {
            title,
            organizer_name,
            location,
            date,
            category,
            image_url: (!image_url.is_empty()).then(|| image_url.to_string()),
            description,
        })
    }

    pub fn reject(&self, message: impl Into<String>) -> AppError {
        AppError::FormRejected {
            message: message.into(),
            input: serde_json::to_value(self).unwrap_or_default(),
        }
    }
}

impl EventFormSubmission {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut submission = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            if name == "image_file" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                // Browsers send an empty part when no file was picked.
                if !file_name.is_empty() && !bytes.is_empty() {
                    submission.image = Some(ImageUpload { file_name, bytes });
                }
                continue;
            }

            let value = field.text().await?;
            let input = &mut submission.input;
            match name.as_str() {
                "title" => input.title = value,
                "organizer_name" => input.organizer_name = value,
                "location" => input.location = value,
                "date" => input.date = value,
                "category" => input.category = value,
                "image_url" => input.image_url = value,
                "description" => input.description = value,
                other => tracing::debug!(field = other, "Ignoring unknown event form field"),
            }
        }

        Ok(submission)
    }

    /// Validates the form and settles the image: an uploaded file wins over
    /// a typed URL, which wins over `fallback_image`.
    pub async fn into_details(
        self,
        uploads: &UploadStore,
        fallback_image: Option<&str>,
    ) -> Result<EventDetails, AppError> {
        let form = self.input.validate().map_err(|msg| self.input.reject(msg))?;

        let image_url = match &self.image {
            Some(upload) => uploads
                .save_image(&upload.file_name, &upload.bytes)
                .await
                .map_err(|e| match AppError::from(e) {
                    AppError::ValidationError(msg) => self.input.reject(msg),
                    other => other,
                })?,
            None => form
                .image_url
                .or_else(|| fallback_image.filter(|u| !u.is_empty()).map(str::to_string))
                .unwrap_or_else(|| PLACEHOLDER_IMAGE_URL.to_string()),
        };

        Ok(EventDetails {
            title: form.title,
            location: form.location,
            date: form.date,
            description: form.description,
            category: form.category,
            image_url,
            organizer_name: form.organizer_name,
        })
    }
}

fn required(label: &str, value: &str, max_len: usize) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{} is required", label));
    }
    if trimmed.chars().count() > max_len {
        return Err(format!("{} must be at most {} characters", label, max_len));
    }
    Ok(trimmed.to_string())
}

/// Accepts the `datetime-local` shapes (read as UTC) and RFC 3339.
pub fn parse_event_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    [DATE_INPUT_FORMAT, DATE_INPUT_FORMAT_SECONDS]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
}
