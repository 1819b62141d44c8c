//! The mirrored user identity and the partial profile update.

use serde::{Deserialize, Serialize};

use super::role::UserRole;

/// Denormalized view of the signed-in user (auth identity + profile record).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl User {
    /// First name if set, otherwise the username.
    pub fn greeting_name(&self) -> &str {
        self.first_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.username)
    }

    /// "First Last" when a first name is set, otherwise the username.
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) if !first.is_empty() => format!("{first} {last}"),
            (Some(first), _) if !first.is_empty() => first.to_string(),
            _ => self.username.clone(),
        }
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(ref username) = update.username {
            self.username = username.clone();
        }
        if let Some(ref first) = update.first_name {
            self.first_name = Some(first.clone());
        }
        if let Some(ref last) = update.last_name {
            self.last_name = Some(last.clone());
        }
        if let Some(ref avatar) = update.avatar_url {
            self.avatar_url = Some(avatar.clone());
        }
    }
}

/// Profile fields a user may change. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.avatar_url.is_none()
    }
}
