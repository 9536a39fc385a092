use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Post {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) author_id: i64,
    pub(crate) created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CreatePostRequest {
    pub(crate) title: String,
    pub(crate) content: String,
}

impl CreatePostRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            title: normalize_title(&self.title)?,
            content: normalize_content(&self.content)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct UpdatePostRequest {
    pub(crate) title: String,
    pub(crate) content: String,
}

impl UpdatePostRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            title: normalize_title(&self.title)?,
            content: normalize_content(&self.content)?,
        })
    }
}

impl Post {
    pub(crate) fn new(
        id: i64,
        title: impl Into<String>,
        content: impl Into<String>,
        author_id: i64,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        validate_positive_i64("id", id)?;
        validate_positive_i64("author_id", author_id)?;
        let title = normalize_title(&title.into())?;
        let content = normalize_content(&content.into())?;

        Ok(Self {
            id,
            title,
            content,
            author_id,
            created_at,
        })
    }
}

fn validate_positive_i64(field: &'static str, value: i64) -> Result<(), DomainError> {
    if value <= 0 {
        return Err(DomainError::Validation {
            field,
            message: "must be > 0",
        });
    }
    Ok(())
}

fn normalize_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    if title.is_empty() || title.len() > 255 {
        return Err(DomainError::Validation {
            field: "title",
            message: "must be 1..255 chars",
        });
    }
    Ok(title.to_string())
}

fn normalize_content(content: &str) -> Result<String, DomainError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(DomainError::Validation {
            field: "content",
            message: "must not be empty",
        });
    }
    Ok(content.to_string())
}
