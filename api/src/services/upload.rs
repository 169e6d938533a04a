use std::path::{Path, PathBuf};

use rocket::fs::TempFile;
use uuid::Uuid;

use crate::error::MarketError;
use crate::media::StoredFile;

const ALLOWED_EXTENSIONS: [&str; 6] = ["jpeg", "jpg", "png", "mp4", "mov", "avi"];

const ALLOWED_MEDIA_TYPES: [&str; 8] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "video/mp4",
    "video/quicktime",
    "video/mov",
    "video/x-msvideo",
    "video/avi",
];

/// Picks the extension a stored upload gets. Both the file name extension and
/// the declared media type must be on the allow lists; anything else is `None`.
pub fn allowed_extension(file_name: Option<&str>, media_type: Option<&str>) -> Option<String> {
    let ext = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())?
        .to_ascii_lowercase();
    let media_type = media_type?.to_ascii_lowercase();
    let accepted = ALLOWED_EXTENSIONS.contains(&ext.as_str())
        && ALLOWED_MEDIA_TYPES.contains(&media_type.as_str());
    accepted.then_some(ext)
}

/// Disk store for multipart uploads; files land as `<uuid>.<ext>`.
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        UploadStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Empty file fields (a form submitted without a selection) yield `None`.
    pub async fn store(&self, file: &mut TempFile<'_>) -> Result<Option<StoredFile>, MarketError> {
        if file.len() == 0 {
            return Ok(None);
        }
        let original_filename = file
            .raw_name()
            .map(|name| name.dangerous_unsafe_unsanitized_raw().as_str().to_string())
            .unwrap_or_default();
        let media_type = file
            .content_type()
            .map(|ct| format!("{}/{}", ct.top(), ct.sub()));
        let ext = allowed_extension(Some(&original_filename), media_type.as_deref())
            .ok_or_else(|| MarketError::validation("Only image and video files are allowed!"))?;

        let stored_filename = format!("{}.{ext}", Uuid::new_v4());
        file.copy_to(self.dir.join(&stored_filename))
            .await
            .map_err(MarketError::internal)?;
        tracing::debug!(original = %original_filename, stored = %stored_filename, "upload stored");
        Ok(Some(StoredFile {
            original_filename,
            stored_filename,
        }))
    }

    pub async fn store_opt(&self, file: Option<&mut TempFile<'_>>) -> Result<Option<StoredFile>, MarketError> {
        match file {
            Some(file) => self.store(file).await,
            None => Ok(None),
        }
    }

    pub async fn store_all(&self, files: &mut [TempFile<'_>]) -> Result<Vec<StoredFile>, MarketError> {
        let mut stored = Vec::with_capacity(files.len());
        for file in files.iter_mut() {
            if let Some(file) = self.store(file).await? {
                stored.push(file);
            }
        }
        Ok(stored)
    }
}
