//! Input validation failure shared by API-facing operations.

use crate::model::student::StudentValidationError;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Malformed caller input with enough context to fix it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// 1-based row of a bulk file, counting the header as row 1.
    pub row: Option<u64>,
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            row: None,
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn at_row(row: u64, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            row: Some(row),
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.row {
            Some(row) => write!(f, "row {row}, field `{}`: {}", self.field, self.message),
            None => write!(f, "field `{}`: {}", self.field, self.message),
        }
    }
}

impl Error for ValidationError {}

impl From<StudentValidationError> for ValidationError {
    fn from(value: StudentValidationError) -> Self {
        Self::new(value.field(), value.to_string())
    }
}
