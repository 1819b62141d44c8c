//! Synchronous form validation for sign-in and registration.
//!
//! Everything here runs before any call to the auth service.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::role::UserRole;
use crate::error::ValidationError;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Raw registration form as submitted.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub role: UserRole,
}

/// Registration that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<Registration, ValidationError> {
        let blank = [
            &self.username,
            &self.email,
            &self.password,
            &self.confirm_password,
        ]
        .iter()
        .any(|f| f.trim().is_empty());
        if blank {
            return Err(ValidationError::MissingFields);
        }

        let email = self.email.trim();
        if !EMAIL_RE.is_match(email) {
            return Err(ValidationError::InvalidEmail);
        }

        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }

        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            });
        }

        Ok(Registration {
            username: self.username.trim().to_string(),
            email: email.to_string(),
            password: self.password.clone(),
            role: self.role,
        })
    }
}

/// Raw sign-in form as submitted.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    /// Returns the trimmed email and the password.
    pub fn validate(&self) -> Result<(String, String), ValidationError> {
        if self.email.trim().is_empty() || self.password.trim().is_empty() {
            return Err(ValidationError::MissingCredentials);
        }
        Ok((self.email.trim().to_string(), self.password.clone()))
    }
}
