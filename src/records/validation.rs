//! Per-field validation with readable messages.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// A single rejected field.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// JSON name of the field that failed validation
    pub field: String,
    pub message: String,
    /// How to fix the value, when there is something useful to say
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn empty_field(field: &str, label: &str) -> Self {
        Self::new(field, format!("{} is required", label))
    }

    pub fn invalid_contact_number(field: &str) -> Self {
        Self::new(field, "Contact number must contain digits only")
            .with_suggestion("Remove spaces, dashes and the leading +, e.g. 9876543210")
    }

    pub fn invalid_email(field: &str) -> Self {
        Self::new(field, "Email address is not valid").with_suggestion("Use the form name@example.com")
    }

    pub fn duplicate_email(field: &str, email: &str) -> Self {
        Self::new(field, format!("Email '{}' is already used by another contact", email))
    }

    pub fn count_out_of_range(field: &str, label: &str, min: usize, max: usize, actual: usize) -> Self {
        Self::new(
            field,
            format!("{} must have between {} and {} entries, got {}", label, min, max, actual),
        )
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, ". {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Collection of validation errors with formatted output.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn single(error: ValidationError) -> Self {
        Self { errors: vec![error] }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Field names in the order they were rejected.
    pub fn fields(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.field.clone()).collect()
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Ok if no errors were collected.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed: {} error(s)", self.errors.len())?;
        for (i, error) in self.errors.iter().enumerate() {
            write!(f, "\n{}. {}", i + 1, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Records that can check their own fields.
pub trait Validator {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

// ============================================================================
// Validation functions
// ============================================================================

/// Validate that a string is not empty after trimming
pub fn validate_required(value: &str, field: &str, label: &str, errors: &mut ValidationErrors) {
    if value.trim().is_empty() {
        errors.add(ValidationError::empty_field(field, label));
    }
}

/// Required and made of ASCII digits only
pub fn validate_contact_number(value: &str, field: &str, label: &str, errors: &mut ValidationErrors) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(ValidationError::empty_field(field, label));
    } else if !trimmed.chars().all(|c| c.is_ascii_digit()) {
        errors.add(ValidationError::invalid_contact_number(field));
    }
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
    })
}

pub fn validate_email(value: &str, field: &str, label: &str, errors: &mut ValidationErrors) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(ValidationError::empty_field(field, label));
    } else if !email_pattern().is_match(trimmed) {
        errors.add(ValidationError::invalid_email(field));
    }
}

/// Table sizes are bounded on both sides.
pub fn validate_count(
    actual: usize,
    min: usize,
    max: usize,
    field: &str,
    label: &str,
    errors: &mut ValidationErrors,
) {
    if actual < min || actual > max {
        errors.add(ValidationError::count_out_of_range(field, label, min, max, actual));
    }
}
