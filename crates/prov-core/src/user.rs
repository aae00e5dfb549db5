//! User profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::role::UserRole;

/// Profile of an authenticated subject.
///
/// Identity itself is established upstream (the API gateway's
/// authorizer); the store only holds the profile keyed by the subject
/// id. A subject seen for the first time gets a default consumer
/// profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Gateway subject id (opaque string, not a UUID we mint).
    pub user_id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Default profile for a subject seen for the first time: consumer
    /// role, username derived from the subject id.
    pub fn default_for(user_id: &str) -> Self {
        let now = Utc::now();
        let prefix: String = user_id.chars().take(8).collect();
        Self {
            user_id: user_id.to_string(),
            username: format!("user_{prefix}"),
            email: None,
            name: None,
            role: UserRole::Consumer,
            location: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Display name preferred for contract arguments and trace entries.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_is_consumer_with_derived_username() {
        let profile = UserProfile::default_for("f81d4fae-7dec-11d0-a765-00a0c91e6bf6");
        assert_eq!(profile.role, UserRole::Consumer);
        assert_eq!(profile.username, "user_f81d4fae");
    }

    #[test]
    fn display_name_prefers_full_name() {
        let mut profile = UserProfile::default_for("abc");
        assert_eq!(profile.display_name(), "user_abc");
        profile.name = Some("Acme Manufacturing".into());
        assert_eq!(profile.display_name(), "Acme Manufacturing");
    }
}
