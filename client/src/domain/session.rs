//! Authenticated principal and the session that carries it.
//!
//! A [`Session`] owns both the bearer token and the [`Principal`]; neither
//! can exist in the store without the other.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::domain::{Role, RoleSet, UserId};

/// Error returned when a bearer token is blank.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("access token must not be empty")]
pub struct EmptyTokenError;

/// Opaque bearer token issued at sign-in.
///
/// The value is wiped from memory on drop and redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(Zeroizing<String>);

impl AccessToken {
    /// Wrap a token string, rejecting blank values.
    pub fn new(raw: impl Into<String>) -> Result<Self, EmptyTokenError> {
        let raw = Zeroizing::new(raw.into());
        if raw.trim().is_empty() {
            return Err(EmptyTokenError);
        }
        Ok(Self(raw))
    }

    /// Token text for the `Authorization` header.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

impl Serialize for AccessToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.expose())
    }
}

impl<'de> Deserialize<'de> for AccessToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

/// The authenticated identity and its role claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    id: UserId,
    username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    roles: RoleSet,
}

impl Principal {
    /// Build a principal from sign-in response values.
    pub fn new(id: UserId, username: impl Into<String>, email: Option<String>, roles: RoleSet) -> Self {
        Self {
            id,
            username: username.into(),
            email,
            roles,
        }
    }

    /// Account identifier.
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Display name used in greetings.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Account email, when the backend reported one.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Roles held by the principal.
    pub const fn roles(&self) -> &RoleSet {
        &self.roles
    }

    /// Whether the principal holds `role`.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }
}

/// Bearer token plus the principal it authenticates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    token: AccessToken,
    principal: Principal,
}

impl Session {
    /// Pair a token with its principal.
    pub const fn new(token: AccessToken, principal: Principal) -> Self {
        Self { token, principal }
    }

    /// Bearer token.
    pub const fn token(&self) -> &AccessToken {
        &self.token
    }

    /// Authenticated principal.
    pub const fn principal(&self) -> &Principal {
        &self.principal
    }
}
