use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Maximum username length, in characters.
pub const USERNAME_MAX_LENGTH: usize = 150;

/// User entity - the author a post belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID and timestamps.
    pub fn new(username: String, email: String) -> Result<Self, DomainError> {
        if username.trim().is_empty() {
            return Err(DomainError::validation("username is required"));
        }
        if username.chars().count() > USERNAME_MAX_LENGTH {
            return Err(DomainError::Validation(format!(
                "username must be at most {USERNAME_MAX_LENGTH} characters"
            )));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            username,
            email,
            created_at: now,
            updated_at: now,
        })
    }
}
