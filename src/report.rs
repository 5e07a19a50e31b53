//! Validation findings and the field-path notation they use.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Accumulated findings of one validation pass.
///
/// Serializes to `{"required": [...], "invalid_type": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Paths of required fields missing from the data.
    pub required: Vec<String>,
    /// Fields whose value does not match the declared type.
    pub invalid_type: Vec<InvalidType>,
}

/// A single type, enum or structure mismatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidType {
    /// Field path, e.g. `objects[3].id` or `parent.name`.
    pub path: String,
    /// `string`, `integer`, `object`, `array`, `enum`, ...
    pub expected_type: String,
    /// The value that was passed.
    pub actually_value: Value,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.invalid_type.is_empty()
    }

    pub fn push_required(&mut self, path: String) {
        self.required.push(path);
    }

    pub fn push_invalid(&mut self, path: String, expected_type: &str, actually_value: Value) {
        self.invalid_type.push(InvalidType {
            path,
            expected_type: expected_type.to_string(),
            actually_value,
        });
    }

    /// Append another report's findings after this one's.
    pub fn merge(&mut self, other: Report) {
        self.required.extend(other.required);
        self.invalid_type.extend(other.invalid_type);
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "validation failed with {} missing and {} invalid field(s)",
            self.required.len(),
            self.invalid_type.len()
        )
    }
}

impl fmt::Display for InvalidType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, got {}",
            self.path, self.expected_type, self.actually_value
        )
    }
}

/// Append `field` to `path`, separated by `.` only when both are non-empty.
pub(crate) fn field_path(path: &str, field: &str) -> String {
    if path.is_empty() || field.is_empty() {
        format!("{}{}", path, field)
    } else {
        format!("{}.{}", path, field)
    }
}

/// Suffix an array index onto `path`: `items` becomes `items[2]`.
pub(crate) fn index_path(path: &str, index: usize) -> String {
    format!("{}[{}]", path, index)
}
