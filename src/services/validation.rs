//! Input checks shared by the client (before submission) and the server (on receipt).

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    error::AppError,
    models::{LoginRequest, RegisterRequest},
};

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 20;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const RATING_MIN: f64 = 0.5;
pub const RATING_MAX: f64 = 5.0;
pub const REVIEW_TEXT_MAX_LEN: usize = 500;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// A rejected input, carrying the message shown to the user
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::InvalidInput(err.0)
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

fn fail<T>(message: &str) -> ValidationResult<T> {
    Err(ValidationError(message.to_string()))
}

/// Validates and normalizes a registration: trims the username, lowercases the email
pub fn validate_registration(request: &RegisterRequest) -> ValidationResult<RegisterRequest> {
    let username = request.username.trim();
    let length = username.chars().count();
    if length < USERNAME_MIN_LEN {
        return fail("Username must be at least 3 characters");
    }
    if length > USERNAME_MAX_LEN {
        return fail("Username must be at most 20 characters");
    }

    let email = validate_email(&request.email)?;

    if request.password.chars().count() < PASSWORD_MIN_LEN {
        return fail("Password must be at least 8 characters");
    }

    Ok(RegisterRequest {
        username: username.to_string(),
        email,
        password: request.password.clone(),
    })
}

pub fn validate_login(request: &LoginRequest) -> ValidationResult<LoginRequest> {
    let email = validate_email(&request.email)?;
    if request.password.is_empty() {
        return fail("Password is required");
    }

    Ok(LoginRequest {
        email,
        password: request.password.clone(),
    })
}

fn validate_email(email: &str) -> ValidationResult<String> {
    let email = email.trim().to_lowercase();
    if !EMAIL_PATTERN.is_match(&email) {
        return fail("Invalid email address");
    }
    Ok(email)
}

pub fn validate_rating(rating: f64) -> ValidationResult<f64> {
    if !(RATING_MIN..=RATING_MAX).contains(&rating) {
        return fail("Rating must be between 0.5 and 5");
    }
    Ok(rating)
}

pub fn validate_review_text(text: Option<&str>) -> ValidationResult<()> {
    match text {
        Some(text) if text.chars().count() > REVIEW_TEXT_MAX_LEN => {
            fail("Review text must be at most 500 characters")
        }
        _ => Ok(()),
    }
}
