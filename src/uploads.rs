//! Photos attached to registration forms.

use chrono::Utc;
use rand::Rng;
use std::path::{Path, PathBuf};

use crate::error::{IntakeError, Result};
use crate::records::Record;

/// Multipart field carrying the applicant's ID photo.
pub const PHOTO_FIELD: &str = "id_photo";
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

const FIELD_PHOTO_PATH: &str = "id_photo_path";
const FIELD_PHOTO_FILENAME: &str = "id_photo_filename";

/// Request body allowance for the registration form, photo included.
pub fn registration_body_limit(body_limit: usize) -> usize {
    body_limit.saturating_add(MAX_PHOTO_BYTES)
}

/// Extension stored for an accepted photo type, `None` for anything else.
fn photo_extension(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavedPhoto {
    pub path: PathBuf,
    pub file_name: String,
}

impl SavedPhoto {
    pub fn attach_to(&self, record: &mut Record) {
        record.insert(FIELD_PHOTO_PATH, self.path.display().to_string());
        record.insert(FIELD_PHOTO_FILENAME, self.file_name.clone());
    }
}

pub struct PhotoStore {
    dir: PathBuf,
}

impl PhotoStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Validate and write a photo under a fresh unique name.
    ///
    /// Only JPEG and PNG are accepted. When the client sends no content type
    /// it is guessed from `original_name`.
    pub async fn save(
        &self,
        original_name: &str,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Result<SavedPhoto> {
        let guessed = mime_guess::from_path(original_name).first_raw();
        let Some(default_ext) = content_type.or(guessed).and_then(photo_extension) else {
            return Err(IntakeError::InvalidInput(
                "Only JPG, JPEG and PNG photos are accepted".to_string(),
            ));
        };
        if data.len() > MAX_PHOTO_BYTES {
            return Err(IntakeError::InvalidInput(format!(
                "Photo exceeds the {} byte limit",
                MAX_PHOTO_BYTES
            )));
        }

        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|e| matches!(e.as_str(), "jpg" | "jpeg" | "png"))
            .unwrap_or_else(|| default_ext.to_string());

        tokio::fs::create_dir_all(&self.dir).await?;
        let suffix: u32 = rand::rng().random_range(0..1_000_000_000);
        let file_name = format!(
            "{}-{}-{}.{}",
            PHOTO_FIELD,
            Utc::now().timestamp_millis(),
            suffix,
            ext
        );
        let path = self.dir.join(&file_name);
        tokio::fs::write(&path, data).await?;

        tracing::info!(file = %file_name, bytes = data.len(), "Photo saved");
        Ok(SavedPhoto { path, file_name })
    }
}
