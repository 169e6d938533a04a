//! Media references.
//!
//! Uploads are persisted as relative references (`/uploads/<stored name>`) and
//! only turned into absolute URLs on the way out, so the public base URL can
//! differ per deployment.

use crate::config::app_config::ConfigError;

pub const UPLOADS_PREFIX: &str = "/uploads";

const ABSOLUTE_SCHEMES: [&str; 2] = ["http://", "https://"];

/// True when `reference` already carries a scheme we serve as-is.
pub fn is_absolute(reference: &str) -> bool {
    ABSOLUTE_SCHEMES.iter().any(|scheme| {
        reference
            .get(..scheme.len())
            .map_or(false, |head| head.eq_ignore_ascii_case(scheme))
    })
}

/// A file handed over by the upload store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub original_filename: String,
    pub stored_filename: String,
}

impl StoredFile {
    /// The relative reference that gets persisted on the document.
    pub fn reference(&self) -> String {
        format!("{UPLOADS_PREFIX}/{}", self.stored_filename)
    }
}

#[derive(Debug, Clone)]
pub struct MediaUrls {
    base_url: String,
}

impl MediaUrls {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        if !is_absolute(base_url) {
            return Err(ConfigError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn normalize(&self, reference: &str) -> String {
        if is_absolute(reference) {
            return reference.to_string();
        }
        if reference.starts_with('/') {
            format!("{}{}", self.base_url, reference)
        } else {
            format!("{}/{}", self.base_url, reference)
        }
    }

    /// Empty references are treated as absent.
    pub fn normalize_opt(&self, reference: Option<&str>) -> Option<String> {
        reference
            .filter(|value| !value.is_empty())
            .map(|value| self.normalize(value))
    }

    pub fn normalize_all(&self, references: &[String]) -> Vec<String> {
        references.iter().map(|r| self.normalize(r)).collect()
    }
}
