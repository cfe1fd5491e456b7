//! User profile entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{MAX_BIO_LENGTH, MIN_NAME_LENGTH, ROLE_ADMIN, ROLE_USER};
use crate::error::{DomainError, DomainResult};
use crate::subscription::Subscription;

/// User roles enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    /// Check if this role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl From<&str> for UserRole {
    fn from(s: &str) -> Self {
        match s {
            ROLE_ADMIN => UserRole::Admin,
            _ => UserRole::User,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "{}", ROLE_ADMIN),
            UserRole::User => write!(f, "{}", ROLE_USER),
        }
    }
}

/// User profile document, keyed by the identity-service user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<Subscription>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create the profile written at sign-up
    pub fn new(id: Uuid, email: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            email: email.into(),
            name: name.into(),
            bio: None,
            photo_url: None,
            is_admin: false,
            subscription: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn role(&self) -> UserRole {
        if self.is_admin {
            UserRole::Admin
        } else {
            UserRole::User
        }
    }

    pub fn has_active_subscription(&self, now: DateTime<Utc>) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(|s| s.is_active_at(now))
    }

    /// Apply a validated profile edit
    pub fn apply(&mut self, update: ProfileUpdate) {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(bio) = update.bio {
            self.bio = non_blank(bio);
        }
        if let Some(photo_url) = update.photo_url {
            self.photo_url = non_blank(photo_url);
        }
        self.updated_at = Utc::now();
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Partial profile edit. An empty `bio` or `photo_url` clears the field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            if name.trim().chars().count() < MIN_NAME_LENGTH {
                return Err(DomainError::validation("Name is required"));
            }
        }
        if let Some(bio) = &self.bio {
            if bio.chars().count() > MAX_BIO_LENGTH {
                return Err(DomainError::validation(format!(
                    "Bio must be at most {} characters",
                    MAX_BIO_LENGTH
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_flag() {
        let mut user = User::new(Uuid::new_v4(), "a@example.com", "A");
        assert_eq!(user.role(), UserRole::User);

        user.is_admin = true;
        assert_eq!(user.role(), UserRole::Admin);
        assert_eq!(user.role().to_string(), "admin");
    }

    #[test]
    fn test_profile_update_trims_and_clears() {
        let mut user = User::new(Uuid::new_v4(), "a@example.com", "A");
        user.bio = Some("Pastry lover".to_string());

        user.apply(ProfileUpdate {
            name: Some("  Camille  ".to_string()),
            bio: Some("   ".to_string()),
            photo_url: None,
        });

        assert_eq!(user.name, "Camille");
        assert_eq!(user.bio, None);
    }

    #[test]
    fn test_profile_update_rejects_blank_name() {
        let update = ProfileUpdate {
            name: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(matches!(update.validate(), Err(DomainError::Validation(_))));
    }
}
