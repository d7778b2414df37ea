//! Session state for the admin console and the public front end
//!
//! Each [`Audience`] owns an isolated credential context. A request is
//! attributed to an audience purely by its target path, see
//! [`Audience::classify`].

pub mod credentials;
pub mod storage;

pub use credentials::{CredentialContext, CredentialStore};
pub use storage::{KeyValueStorage, MemoryStorage, StorageError};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// Path segment that marks an administrative endpoint or page
pub const ADMIN_MARKER: &str = "admin";

/// Role required for the admin console
pub const ADMIN_ROLE: &str = "admin";

/// Who a session or request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    Admin,
    Front,
}

impl Audience {
    /// Classify a request or route path.
    ///
    /// Any path with an `admin` segment belongs to the admin audience, every
    /// other path to the front. Query strings and fragments are ignored.
    pub fn classify(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        if path.split('/').any(|segment| segment == ADMIN_MARKER) {
            Self::Admin
        } else {
            Self::Front
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Front => "front",
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-assigned user identifier, numeric or textual depending on backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Numeric(i64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// User profile returned by the login endpoint and persisted with the token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Remaining profile fields, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl UserProfile {
    pub fn new(id: UserId, role: impl Into<String>) -> Self {
        Self {
            id,
            role: role.into(),
            username: None,
            extra: Map::new(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}

/// A fully present session: token and profile for one audience
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub audience: Audience,
    pub token: String,
    pub user: UserProfile,
}
