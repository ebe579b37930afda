//! Role claims carried by the signed-in principal.
//!
//! The backend reports authorities such as `ROLE_LIBRARIAN`; older payloads
//! and operator input use bare names like `librarian`. Every spelling is
//! parsed once into [`Role`], so membership checks are set lookups rather
//! than string scans.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

const AUTHORITY_PREFIX: &str = "ROLE_";

/// Coarse permission label controlling feature visibility and write access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    /// Full administrative access.
    Admin,
    /// Staff who manage the catalogue, members and loans.
    Librarian,
    /// Library patron.
    Member,
}

/// Error returned when a role name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {name}")]
pub struct UnknownRoleError {
    /// The rejected role name.
    pub name: String,
}

impl Role {
    /// Every role, in ascending privilege order of the enum.
    pub const ALL: [Self; 3] = [Self::Admin, Self::Librarian, Self::Member];

    /// Canonical upper-case name, e.g. `LIBRARIAN`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Librarian => "LIBRARIAN",
            Self::Member => "MEMBER",
        }
    }

    /// Lower-case name the signup endpoint expects, e.g. `librarian`.
    pub const fn signup_name(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Librarian => "librarian",
            Self::Member => "member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let bare = upper.strip_prefix(AUTHORITY_PREFIX).unwrap_or(&upper);
        match bare {
            "ADMIN" => Ok(Self::Admin),
            "LIBRARIAN" => Ok(Self::Librarian),
            "MEMBER" => Ok(Self::Member),
            _ => Err(UnknownRoleError { name: s.to_owned() }),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRoleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_owned()
    }
}

/// Set of roles held by a principal.
///
/// # Examples
/// ```
/// use library_client::domain::{Role, RoleSet};
///
/// let roles = RoleSet::from_names(["ROLE_LIBRARIAN", "bogus"]);
/// assert!(roles.contains(Role::Librarian));
/// assert_eq!(roles.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    /// Empty role set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse wire role names, dropping (and logging) unknown ones.
    pub fn from_names<I, T>(names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut roles = BTreeSet::new();
        for name in names {
            match name.as_ref().parse::<Role>() {
                Ok(role) => {
                    roles.insert(role);
                }
                Err(error) => warn!(%error, "ignoring unrecognised role claim"),
            }
        }
        Self(roles)
    }

    /// Whether `role` is held.
    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// Whether any of `roles` is held.
    pub fn contains_any(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.contains(*role))
    }

    /// Number of distinct roles held.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no role is held.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate roles in enum order.
    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Role::as_str).collect();
        f.write_str(&names.join(", "))
    }
}
