//! # Identity Extraction
//!
//! Authentication happens upstream (the API gateway validates the
//! token and injects the subject id); this module only consumes the
//! resulting claim. [`UserIdentity`] is an extractor that reads the
//! `x-user-id` header, loads the subject's profile, and creates a
//! default consumer profile on first sight.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use prov_core::{UserProfile, UserRole};
use prov_store::Store;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the gateway-authenticated subject id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller and their stored profile.
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub profile: UserProfile,
}

impl UserIdentity {
    /// Reject the request unless the caller holds one of the allowed
    /// roles.
    pub fn require_role(&self, allowed: &[UserRole]) -> Result<(), AppError> {
        if allowed.contains(&self.profile.role) {
            Ok(())
        } else {
            let roles: Vec<&str> = allowed.iter().map(UserRole::as_str).collect();
            Err(AppError::Forbidden(format!(
                "requires one of the roles: {}",
                roles.join(", ")
            )))
        }
    }

    pub fn user_id(&self) -> &str {
        &self.profile.user_id
    }
}

/// Load the profile for a subject, creating the default consumer
/// profile on first sight.
pub async fn load_or_create_profile(
    store: &dyn Store,
    user_id: &str,
) -> Result<UserProfile, AppError> {
    if let Some(profile) = store.user(user_id).await? {
        return Ok(profile);
    }

    let profile = UserProfile::default_for(user_id);
    store.put_user(&profile).await?;
    tracing::info!(user_id = %user_id, "created default user profile");
    Ok(profile)
}

#[async_trait]
impl FromRequestParts<AppState> for UserIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::Unauthorized("missing user id claim".to_string()))?
            .to_string();

        let profile = load_or_create_profile(&*state.store, &user_id).await?;
        Ok(Self { profile })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prov_store::MemoryStore;

    #[tokio::test]
    async fn first_sight_creates_consumer_profile() {
        let store = MemoryStore::new();
        let profile = load_or_create_profile(&store, "subject-1").await.unwrap();
        assert_eq!(profile.role, UserRole::Consumer);

        // Second call returns the stored profile, not a new one.
        let again = load_or_create_profile(&store, "subject-1").await.unwrap();
        assert_eq!(again, profile);
    }

    #[test]
    fn role_guard() {
        let identity = UserIdentity {
            profile: UserProfile::default_for("u1"),
        };
        assert!(identity.require_role(&[UserRole::Consumer]).is_ok());
        let err = identity
            .require_role(&[UserRole::Manufacturer, UserRole::Retailer])
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
