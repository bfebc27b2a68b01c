//! Field-level input checks applied to request payloads before they reach the
//! lending rules.

use libris_http::error::AppError;
use serde::Serialize;

pub const TITLE_TOO_SHORT: &str = "Title must be at least 3 characters long";
pub const TITLE_NOT_CAPITALIZED: &str = "The book name must start with a capital letter";
pub const AUTHOR_NOT_TWO_WORDS: &str =
    "The author should contain two capital words with name and surname and space between.";
pub const NAME_BLANK: &str = "Name cannot be blank";

/// One failed check on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub error: String,
}

impl FieldError {
    pub fn new(field: &'static str, error: impl Into<String>) -> Self {
        Self {
            field,
            error: error.into(),
        }
    }
}

/// Every failed check of one payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, result: Result<(), FieldError>) {
        if let Err(err) = result {
            self.0.push(err);
        }
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Messages joined with `"; "`.
    pub fn message(&self) -> String {
        self.0
            .iter()
            .map(|err| err.error.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let message = errors.message();
        let details = errors
            .0
            .into_iter()
            .map(|err| serde_json::json!({ "field": err.field, "error": err.error }))
            .collect();
        AppError::validation(details, message)
    }
}

/// Payloads that can check their own fields.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

pub fn min_chars(
    field: &'static str,
    value: &str,
    min: usize,
    message: &str,
) -> Result<(), FieldError> {
    if value.chars().count() >= min {
        Ok(())
    } else {
        Err(FieldError::new(field, message))
    }
}

pub fn first_capital_letter(field: &'static str, value: &str) -> Result<(), FieldError> {
    match value.chars().next() {
        Some(first) if first.is_uppercase() => Ok(()),
        _ => Err(FieldError::new(field, TITLE_NOT_CAPITALIZED)),
    }
}

/// Exactly two non-empty words separated by one space, each capitalized.
pub fn two_capitalized_words(field: &'static str, value: &str) -> Result<(), FieldError> {
    let words: Vec<&str> = value.split(' ').collect();
    let valid = words.len() == 2
        && words
            .iter()
            .all(|word| word.chars().next().is_some_and(char::is_uppercase));

    if valid {
        Ok(())
    } else {
        Err(FieldError::new(field, AUTHOR_NOT_TWO_WORDS))
    }
}

pub fn not_blank(field: &'static str, value: &str) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        Err(FieldError::new(field, NAME_BLANK))
    } else {
        Ok(())
    }
}
