//! Storage for event images uploaded with the event form.
//!
//! Files land in the configured upload directory and are served back under
//! [`UPLOAD_URL_PREFIX`].

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

pub const UPLOAD_URL_PREFIX: &str = "/static/uploads";
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];
pub const PLACEHOLDER_IMAGE_URL: &str = "https://placehold.co/1200x600?text=Event+Image";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("file name '{0}' is not usable")]
    InvalidFileName(String),

    #[error("image type '.{0}' is not allowed (use jpg, jpeg, png, gif or webp)")]
    DisallowedExtension(String),

    #[error("uploaded image is empty")]
    Empty,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persists an image and returns the URL it is served under.
    pub async fn save_image(&self, original_name: &str, bytes: &[u8]) -> Result<String, UploadError> {
        let clean = sanitize_file_name(original_name)
            .ok_or_else(|| UploadError::InvalidFileName(original_name.to_string()))?;
        check_image_extension(&clean)?;
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }

        let stored_name = format!("{}_{}", Uuid::new_v4().simple(), clean);
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&stored_name), bytes).await?;

        tracing::info!(file = %stored_name, size = bytes.len(), "Stored uploaded image");
        Ok(format!("{}/{}", UPLOAD_URL_PREFIX, stored_name))
    }
}

/// Reduces a client supplied name to its final path component made of
/// `[A-Za-z0-9._-]`. Returns `None` when nothing usable is left.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

pub fn check_image_extension(file_name: &str) -> Result<(), UploadError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(UploadError::DisallowedExtension(ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directories_and_odd_characters() {
        assert_eq!(
            sanitize_file_name("../../etc/pass wd.png").as_deref(),
            Some("pass_wd.png")
        );
        assert_eq!(
            sanitize_file_name("C:\\Users\\me\\Poster (final).JPG").as_deref(),
            Some("Poster_final.JPG")
        );
        assert_eq!(sanitize_file_name(".hidden.gif").as_deref(), Some("hidden.gif"));
        assert_eq!(sanitize_file_name("///"), None);
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        for name in ["a.jpg", "a.JPEG", "a.png", "a.Gif", "a.webp"] {
            assert!(check_image_extension(name).is_ok(), "{name} should pass");
        }
        assert!(matches!(
            check_image_extension("a.svg"),
            Err(UploadError::DisallowedExtension(ext)) if ext == "svg"
        ));
        assert!(check_image_extension("noext").is_err());
    }

    #[tokio::test]
    async fn save_image_writes_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().join("uploads"));

        let url = store.save_image("banner.png", b"\x89PNG....").await.unwrap();
        assert!(url.starts_with("/static/uploads/"));
        assert!(url.ends_with("_banner.png"));

        let stored = url.rsplit('/').next().unwrap();
        let bytes = std::fs::read(store.dir().join(stored)).unwrap();
        assert_eq!(bytes, b"\x89PNG....");
    }

    #[tokio::test]
    async fn save_image_rejects_bad_extension_and_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());

        assert!(matches!(
            store.save_image("script.exe", b"MZ").await,
            Err(UploadError::DisallowedExtension(_))
        ));
        assert!(matches!(
            store.save_image("empty.png", b"").await,
            Err(UploadError::Empty)
        ));
    }
}
