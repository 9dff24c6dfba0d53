//! Field validation applied by every store on write.
//!
//! Both `create` and `update` run the same rules, so a contact can never be
//! persisted through this crate with an empty name or a malformed number.
//! Values are checked exactly as submitted; nothing is trimmed.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::contact::{ContactFields, ContactInput};

/// Minimum number of characters in a phone number.
pub const NUMBER_MIN_LENGTH: usize = 8;

/// Two or three digits, then one or more dash separated digit groups.
const NUMBER_PATTERN: &str = r"^\d{2,3}(-\d+)+$";

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(NUMBER_PATTERN).expect("number pattern is a valid regex"))
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Name of the offending field.
    pub field: &'static str,
    /// Human readable reason.
    pub message: String,
}

impl FieldError {
    /// The field was absent or empty.
    #[must_use]
    pub fn required(field: &'static str) -> Self {
        Self {
            field,
            message: format!("Path `{field}` is required."),
        }
    }

    fn too_short(field: &'static str, value: &str, min: usize) -> Self {
        Self {
            field,
            message: format!(
                "Path `{field}` (`{value}`) is shorter than the minimum allowed length ({min})."
            ),
        }
    }

    fn bad_number(value: &str) -> Self {
        Self {
            field: "number",
            message: format!("`{value}` is not a valid phone number!"),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// A rejected write, carrying every field that failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Contact validation failed: {}", join_fields(.errors))]
pub struct ValidationError {
    errors: Vec<FieldError>,
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    /// Build an error from the failed fields.
    #[must_use]
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    /// The individual field failures.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }
}

/// Check a submitted contact and return the fields to persist.
///
/// # Errors
///
/// Returns a [`ValidationError`] listing every field that failed, in
/// `name`, `number` order.
pub fn validate(input: &ContactInput) -> Result<ContactFields, ValidationError> {
    let mut errors = Vec::new();

    let name = match input.name.as_deref() {
        Some(name) if !name.is_empty() => Some(name),
        _ => {
            errors.push(FieldError::required("name"));
            None
        }
    };

    let number = match input.number.as_deref() {
        Some(number) if !number.is_empty() => {
            if number.chars().count() < NUMBER_MIN_LENGTH {
                errors.push(FieldError::too_short("number", number, NUMBER_MIN_LENGTH));
                None
            } else if !number_pattern().is_match(number) {
                errors.push(FieldError::bad_number(number));
                None
            } else {
                Some(number)
            }
        }
        _ => {
            errors.push(FieldError::required("number"));
            None
        }
    };

    match (name, number) {
        (Some(name), Some(number)) if errors.is_empty() => Ok(ContactFields {
            name: name.to_string(),
            number: number.to_string(),
        }),
        _ => Err(ValidationError::new(errors)),
    }
}
