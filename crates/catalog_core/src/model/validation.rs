//! Field-scoped validation results.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One validation failure attached to a representation field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMessage {
    pub field_name: String,
    pub message: String,
}

impl FieldMessage {
    pub fn new(field_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            message: message.into(),
        }
    }
}

/// Accumulated field failures for one entity or representation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    pub fields: Vec<FieldMessage>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field_name: impl Into<String>, message: impl Into<String>) -> Self {
        let mut error = Self::new();
        error.push(field_name, message);
        error
    }

    pub fn push(&mut self, field_name: impl Into<String>, message: impl Into<String>) {
        self.fields.push(FieldMessage::new(field_name, message));
    }

    /// Appends the failures of `result`, if any.
    pub fn merge(&mut self, result: Result<(), ValidationError>) {
        if let Err(other) = result {
            self.fields.extend(other.fields);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn has_field(&self, field_name: &str) -> bool {
        self.fields
            .iter()
            .any(|field| field.field_name == field_name)
    }

    /// `Ok(())` when nothing was recorded, `Err(self)` otherwise.
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed")?;
        for (index, field) in self.fields.iter().enumerate() {
            let separator = if index == 0 { ": " } else { "; " };
            write!(f, "{separator}{} {}", field.field_name, field.message)?;
        }
        Ok(())
    }
}

impl Error for ValidationError {}
