//! Helpers for turning raw form values into typed fields.

use serde::de::value::{Error as ValueError, StrDeserializer};
use serde::de::{DeserializeOwned, IntoDeserializer};

use crate::error::MarketError;

/// A value counts as present when it has non-whitespace content.
pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Names of every field in `fields` that is absent or blank.
pub fn missing<'a>(fields: &[(&'a str, bool)]) -> Vec<&'a str> {
    fields
        .iter()
        .filter(|(_, is_present)| !is_present)
        .map(|(name, _)| *name)
        .collect()
}

pub fn ensure_present(fields: &[(&str, bool)]) -> Result<(), MarketError> {
    let missing = missing(fields);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(MarketError::validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

/// Parses a plain string into an enum using its serde spelling.
pub fn parse_enum<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let deserializer: StrDeserializer<'_, ValueError> = raw.trim().into_deserializer();
    T::deserialize(deserializer).ok()
}

/// Multi-valued form fields arrive either as repeated values or as a single
/// JSON array string. Both shapes are flattened into one list.
pub fn flatten_list(values: &[String]) -> Result<Vec<String>, serde_json::Error> {
    let mut flattened = Vec::new();
    for value in values {
        let trimmed = value.trim();
        if trimmed.starts_with('[') {
            flattened.extend(serde_json::from_str::<Vec<String>>(trimmed)?);
        } else if !trimmed.is_empty() {
            flattened.push(trimmed.to_string());
        }
    }
    Ok(flattened)
}

/// Optional JSON blob; blank means "not provided".
pub fn parse_json_blob<T: DeserializeOwned>(value: &Option<String>) -> Result<Option<T>, serde_json::Error> {
    match present(value) {
        Some(blob) => serde_json::from_str(blob).map(Some),
        None => Ok(None),
    }
}
