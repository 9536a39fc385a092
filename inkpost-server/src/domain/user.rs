use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use super::error::DomainError;

/// Filename a freshly registered account points at until a picture is
/// uploaded. Never deleted from the media directory.
pub(crate) const DEFAULT_IMAGE_FILE: &str = "default.jpg";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RegisterRequest {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password: String,
}

impl RegisterRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let username = normalize_username(&self.username)?;
        let email = normalize_email(&self.email)?;
        let password_len = self.password.chars().count();
        if password_len < 8 || password_len > 128 {
            return Err(DomainError::Validation {
                field: "password",
                message: "must be 8..128 chars",
            });
        }
        Ok(Self {
            username,
            email,
            password: self.password,
        })
    }
}

/// Login is keyed by email; `remember` asks for a long-lived session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) email: String,
    pub(crate) password: String,
    pub(crate) remember: bool,
}

impl LoginRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let email = normalize_email(&self.email)?;
        if self.password.is_empty() {
            return Err(DomainError::Validation {
                field: "password",
                message: "must not be empty",
            });
        }
        Ok(Self {
            email,
            password: self.password,
            remember: self.remember,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct UpdateAccountRequest {
    pub(crate) username: String,
    pub(crate) email: String,
}

impl UpdateAccountRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            username: normalize_username(&self.username)?,
            email: normalize_email(&self.email)?,
        })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct User {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) image_file: String,
    pub(crate) created_at: DateTime<Utc>,
}

impl User {
    pub(crate) fn new(
        id: i64,
        username: impl Into<String>,
        email: impl Into<String>,
        image_file: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if id <= 0 {
            return Err(DomainError::Validation {
                field: "id",
                message: "must be > 0",
            });
        }
        let username = normalize_username(&username.into())?;
        let email = normalize_email(&email.into())?;
        let image_file = image_file.into();
        if image_file.is_empty() {
            return Err(DomainError::Validation {
                field: "image_file",
                message: "must not be empty",
            });
        }

        Ok(Self {
            id,
            username,
            email,
            image_file,
            created_at,
        })
    }
}

fn normalize_username(username: &str) -> Result<String, DomainError> {
    let username = username.trim();
    let length = username.chars().count();
    if length < 3 || length > 64 {
        return Err(DomainError::Validation {
            field: "username",
            message: "must be 3..64 chars",
        });
    }
    Ok(username.to_string())
}

fn normalize_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim().to_lowercase();
    if !email.validate_email() {
        return Err(DomainError::Validation {
            field: "email",
            message: "must be a valid email",
        });
    }
    Ok(email)
}
