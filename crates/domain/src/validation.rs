//! Small input helpers shared by the services.

use common::EntityId;

use crate::error::{DomainError, Result};

/// Returns the trimmed value, or a validation error with `message` when it is
/// missing or blank.
pub fn required(value: Option<&str>, message: &str) -> Result<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(DomainError::validation(message)),
    }
}

/// Trims optional text; blank becomes `None`.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Lowercases `name` and joins its words with `-`.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Parses an id taken from a request, naming `what` in the error.
pub fn parse_id(value: &str, what: &str) -> Result<EntityId> {
    EntityId::parse(value).map_err(|_| DomainError::validation(format!("Invalid {what} id: {value}")))
}

/// Parses a list of ids, skipping duplicates while keeping the first order.
pub fn parse_ids(values: &[String], what: &str) -> Result<Vec<EntityId>> {
    let mut ids = Vec::with_capacity(values.len());
    for value in values {
        let id = parse_id(value, what)?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}
