//! Per-audience credential contexts

use super::storage::{KeyValueStorage, StorageError};
use super::{Audience, Session, UserProfile};
use std::sync::Arc;

/// Token and profile storage for a single audience.
///
/// The token is stored raw and the profile as JSON, each under its own key.
#[derive(Clone)]
pub struct CredentialContext {
    audience: Audience,
    token_key: &'static str,
    user_key: &'static str,
    storage: Arc<dyn KeyValueStorage>,
}

impl CredentialContext {
    /// Admin console context, keys `admin_token` / `admin_user`
    pub fn admin(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            audience: Audience::Admin,
            token_key: "admin_token",
            user_key: "admin_user",
            storage,
        }
    }

    /// Public front context, keys `front_token` / `front_user`
    pub fn front(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            audience: Audience::Front,
            token_key: "front_token",
            user_key: "front_user",
            storage,
        }
    }

    pub const fn audience(&self) -> Audience {
        self.audience
    }

    /// Persist a session.
    ///
    /// # Errors
    ///
    /// Returns an error if either write fails. A failed profile write removes
    /// the token again so the session is never left half-written.
    pub fn set_session(&self, token: &str, user: &UserProfile) -> Result<(), StorageError> {
        let user_json = serde_json::to_string(user)?;

        self.storage.set(self.token_key, token)?;
        if let Err(err) = self.storage.set(self.user_key, &user_json) {
            if let Err(rollback) = self.storage.remove(self.token_key) {
                error!(
                    audience = %self.audience,
                    error = %rollback,
                    "Failed to roll back token after profile write failure"
                );
            }
            return Err(err);
        }

        debug!(audience = %self.audience, user_id = %user.id, "Session stored");
        Ok(())
    }

    /// Stored token, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read
    pub fn token(&self) -> Result<Option<String>, StorageError> {
        Ok(self
            .storage
            .get(self.token_key)?
            .filter(|token| !token.is_empty()))
    }

    /// Stored user profile. Unreadable or corrupt data yields `None`.
    pub fn user(&self) -> Option<UserProfile> {
        let raw = match self.storage.get(self.user_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(audience = %self.audience, error = %err, "Failed to read stored user profile");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(err) => {
                warn!(audience = %self.audience, error = %err, "Ignoring corrupt stored user profile");
                None
            }
        }
    }

    /// Full session when both token and profile are present and readable
    pub fn session(&self) -> Option<Session> {
        let token = self.token().ok().flatten()?;
        let user = self.user()?;
        Some(Session {
            audience: self.audience,
            token,
            user,
        })
    }

    /// Remove token and profile.
    ///
    /// # Errors
    ///
    /// Both keys are always attempted; the first failure is returned.
    pub fn clear(&self) -> Result<(), StorageError> {
        let token_result = self.storage.remove(self.token_key);
        let user_result = self.storage.remove(self.user_key);
        debug!(audience = %self.audience, "Session cleared");
        token_result.and(user_result)
    }

    /// A token is present. The server remains the authority on its validity.
    pub fn is_authenticated(&self) -> bool {
        match self.token() {
            Ok(token) => token.is_some(),
            Err(err) => {
                warn!(audience = %self.audience, error = %err, "Failed to read stored token");
                false
            }
        }
    }

    /// The stored profile carries `role`
    pub fn has_role(&self, role: &str) -> bool {
        self.user().is_some_and(|user| user.has_role(role))
    }
}

/// Credentials for both audiences.
///
/// The two contexts never share keys, so logging out of the console leaves a
/// front session untouched and vice versa.
#[derive(Clone)]
pub struct CredentialStore {
    admin: CredentialContext,
    front: CredentialContext,
}

impl CredentialStore {
    /// Create a store whose two contexts live side by side in `storage`
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            admin: CredentialContext::admin(storage.clone()),
            front: CredentialContext::front(storage),
        }
    }

    pub const fn context(&self, audience: Audience) -> &CredentialContext {
        match audience {
            Audience::Admin => &self.admin,
            Audience::Front => &self.front,
        }
    }

    pub const fn admin(&self) -> &CredentialContext {
        &self.admin
    }

    pub const fn front(&self) -> &CredentialContext {
        &self.front
    }

    /// # Errors
    ///
    /// See [`CredentialContext::set_session`]
    pub fn set_session(
        &self,
        audience: Audience,
        token: &str,
        user: &UserProfile,
    ) -> Result<(), StorageError> {
        self.context(audience).set_session(token, user)
    }

    /// # Errors
    ///
    /// See [`CredentialContext::token`]
    pub fn token(&self, audience: Audience) -> Result<Option<String>, StorageError> {
        self.context(audience).token()
    }

    pub fn user(&self, audience: Audience) -> Option<UserProfile> {
        self.context(audience).user()
    }

    pub fn session(&self, audience: Audience) -> Option<Session> {
        self.context(audience).session()
    }

    /// # Errors
    ///
    /// See [`CredentialContext::clear`]
    pub fn clear_session(&self, audience: Audience) -> Result<(), StorageError> {
        self.context(audience).clear()
    }

    pub fn is_authenticated(&self, audience: Audience) -> bool {
        self.context(audience).is_authenticated()
    }

    pub fn has_role(&self, audience: Audience, role: &str) -> bool {
        self.context(audience).has_role(role)
    }
}
