//! Request validation with stable, field-keyed messages
//!
//! `validator` reports failures by Rust field name and rule code. The
//! [`RequestValidator`] held in the application state turns those into
//! `{ jsonField: message }` entries using an explicit message catalog.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::error::{AppError, AppResult, FieldErrors};

static PASSWORD_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").unwrap());

/// Passwords mix upper and lower case letters and carry no special characters
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());

    if PASSWORD_CHARS.is_match(password) && has_upper && has_lower {
        Ok(())
    } else {
        Err(ValidationError::new("validatepassword"))
    }
}

/// Rust field names whose JSON name is not plain camelCase
const FIELD_OVERRIDES: &[(&str, &str)] = &[
    ("id", "ID"),
    ("isbn", "ISBN"),
    ("description", "desc"),
    ("book_id", "bookID"),
    ("user_id", "userID"),
    ("checkout_id", "checkoutID"),
];

#[derive(Debug, Clone)]
pub struct RequestValidator {
    messages: HashMap<String, String>,
}

impl RequestValidator {
    pub fn new() -> Self {
        let entries = [
            ("email.email", "should be email"),
            ("role.required", "should be one of librarian or patrons"),
            (
                "password.validatepassword",
                "password should contain uppercase and lowercase letter and no special character",
            ),
            ("password.length", "should be between 8 and 20 characters"),
            ("page.range", "should be at least 1"),
            ("limit.range", "should be at least 5"),
            ("rating.range", "should be between 0 and 5"),
            ("type.oneof", "should be one of book or user"),
            ("favoriteGenres.oneof", "should only contain known genres"),
            ("state.transition", "is not a valid checkout state"),
        ];

        Self {
            messages: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Validate `value`, mapping failures to [`AppError::Validation`]
    pub fn validate<T: Validate>(&self, value: &T) -> AppResult<()> {
        value
            .validate()
            .map_err(|errors| AppError::Validation(self.messages_for(&errors)))
    }

    /// Message for a (json field, rule) pair
    pub fn message(&self, field: &str, error: &ValidationError) -> String {
        let key = format!("{}.{}", field, error.code);
        if let Some(message) = self.messages.get(&key) {
            return message.clone();
        }

        match error.code.as_ref() {
            "required" => "is required".to_string(),
            "email" => "should be email".to_string(),
            "uuid" => "should be uuid".to_string(),
            "length" => match (error.params.get("min"), error.params.get("max")) {
                (Some(min), _) if min.as_u64() == Some(1) && is_empty_value(error) => "is required".to_string(),
                (Some(min), None) if min.as_u64() == Some(1) => "is required".to_string(),
                (Some(min), Some(max)) => format!("should be between {} and {} characters", min, max),
                (Some(min), None) => format!("should be at least {} characters", min),
                (None, Some(max)) => format!("should be at most {} characters", max),
                _ => "has an invalid length".to_string(),
            },
            "range" => match (error.params.get("min"), error.params.get("max")) {
                (Some(min), Some(max)) => format!("should be between {} and {}", min, max),
                (Some(min), None) => format!("should be at least {}", min),
                (None, Some(max)) => format!("should be at most {}", max),
                _ => "is out of range".to_string(),
            },
            code => format!("failed the {} check", code),
        }
    }

    /// Single field failure for checks performed outside `validator`
    pub fn reject(&self, field: &str, code: &'static str) -> AppError {
        let message = self.message(field, &ValidationError::new(code));
        AppError::field(field, message)
    }

    fn messages_for(&self, errors: &ValidationErrors) -> FieldErrors {
        let mut out = Vec::new();
        self.collect(errors, &mut out);
        out
    }

    fn collect(&self, errors: &ValidationErrors, out: &mut FieldErrors) {
        let mut fields: Vec<_> = errors.errors().iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));

        for (field, kind) in fields {
            let name = json_field_name(field);
            match kind {
                ValidationErrorsKind::Field(list) => {
                    // First failing rule decides the message
                    if let Some(error) = list.first() {
                        let mut entry = BTreeMap::new();
                        entry.insert(name.clone(), self.message(&name, error));
                        out.push(entry);
                    }
                }
                ValidationErrorsKind::Struct(nested) => self.collect(nested, out),
                ValidationErrorsKind::List(items) => {
                    for nested in items.values() {
                        self.collect(nested, out);
                    }
                }
            }
        }
    }
}

fn is_empty_value(error: &ValidationError) -> bool {
    error.params.get("value").and_then(|v| v.as_str()) == Some("")
}

impl Default for RequestValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// snake_case Rust field name to the JSON name clients send
pub fn json_field_name(field: &str) -> String {
    if let Some((_, json)) = FIELD_OVERRIDES.iter().find(|(rust, _)| *rust == field) {
        return json.to_string();
    }

    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    use crate::models::book::CreateBook;

    #[derive(Debug, Deserialize, Validate)]
    struct Sample {
        #[validate(email)]
        email: String,
        #[validate(length(min = 1))]
        cover_image: String,
        #[validate(range(min = 5))]
        limit: u32,
        #[validate(length(min = 1))]
        isbn: String,
    }

    #[test]
    fn test_password_rule() {
        assert!(validate_password("Password1").is_ok());
        assert!(validate_password("password1").is_err());
        assert!(validate_password("PASSWORD1").is_err());
        assert!(validate_password("Pass word1").is_err());
        assert!(validate_password("Pass@word1").is_err());
    }

    #[test]
    fn test_json_field_names() {
        assert_eq!(json_field_name("cover_image"), "coverImage");
        assert_eq!(json_field_name("number_of_days"), "numberOfDays");
        assert_eq!(json_field_name("isbn"), "ISBN");
        assert_eq!(json_field_name("book_id"), "bookID");
        assert_eq!(json_field_name("title"), "title");
    }

    #[test]
    fn test_messages_are_field_keyed() {
        let validator = RequestValidator::new();
        let sample = Sample {
            email: "not-an-email".into(),
            cover_image: String::new(),
            limit: 2,
            isbn: String::new(),
        };

        let err = validator.validate(&sample).unwrap_err();
        let AppError::Validation(fields) = err else {
            panic!("expected validation error");
        };

        let flat: BTreeMap<String, String> = fields.into_iter().flatten().collect();
        assert_eq!(flat["email"], "should be email");
        assert_eq!(flat["coverImage"], "is required");
        assert_eq!(flat["limit"], "should be at least 5");
        assert_eq!(flat["ISBN"], "is required");
    }

    #[test]
    fn test_valid_input_passes() {
        let validator = RequestValidator::new();
        let sample = Sample {
            email: "reader@example.com".into(),
            cover_image: "http://img".into(),
            limit: 10,
            isbn: "123".into(),
        };
        assert!(validator.validate(&sample).is_ok());
    }

    #[test]
    fn test_isbn_wider_than_column_is_rejected() {
        let validator = RequestValidator::new();
        let mut book = CreateBook::unshelved("9".repeat(37), "Title".into());
        book.cover_image = "http://img".into();
        book.author = "Author".into();

        let AppError::Validation(fields) = validator.validate(&book).unwrap_err() else {
            panic!("expected validation error");
        };
        let flat: BTreeMap<String, String> = fields.into_iter().flatten().collect();
        assert_eq!(flat["ISBN"], "should be between 1 and 32 characters");

        book.isbn = String::new();
        let AppError::Validation(fields) = validator.validate(&book).unwrap_err() else {
            panic!("expected validation error");
        };
        let flat: BTreeMap<String, String> = fields.into_iter().flatten().collect();
        assert_eq!(flat["ISBN"], "is required");

        book.isbn = "9".repeat(32);
        assert!(validator.validate(&book).is_ok());
    }

    #[test]
    fn test_reject_uses_catalog() {
        let validator = RequestValidator::new();
        let AppError::Validation(fields) = validator.reject("type", "oneof") else {
            panic!("expected validation error");
        };
        assert_eq!(fields[0]["type"], "should be one of book or user");
    }
}
