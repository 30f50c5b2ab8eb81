use std::fmt;

use crate::error::{Error, Result};

const MAX_IDENTIFIER_LEN: usize = 64;

/// One failed check on a named field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Collects every failed field check for a resource and reports them together
/// as a single [`Error::Validation`].
pub struct Validation {
    resource: String,
    errors: Vec<FieldError>,
}

impl Validation {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            errors: Vec::new(),
        }
    }

    pub fn check(mut self, field: &str, outcome: std::result::Result<(), String>) -> Self {
        if let Err(reason) = outcome {
            self.errors.push(FieldError {
                field: field.to_string(),
                reason,
            });
        }
        self
    }

    pub fn finish(self) -> Result<()> {
        if self.errors.is_empty() {
            return Ok(());
        }
        Err(Error::Validation {
            resource: self.resource,
            errors: self.errors,
        })
    }
}

pub fn non_empty(value: &str) -> std::result::Result<(), String> {
    if value.trim().is_empty() {
        return Err("cannot be empty".into());
    }
    Ok(())
}

/// A plain SQL identifier: ASCII letters, digits and underscores, not
/// starting with a digit. Such names never need escaping inside double quotes.
pub fn identifier(name: &str) -> std::result::Result<(), String> {
    non_empty(name)?;
    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(format!("longer than {MAX_IDENTIFIER_LEN} characters"));
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err("cannot start with a digit".into());
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err("only letters, digits and underscores are allowed".into());
    }
    Ok(())
}
