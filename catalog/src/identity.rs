//! User identity.
//!
//! Operations never look up the signed-in user themselves; the caller passes
//! it in explicitly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// Identifier of an authenticated user.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a raw user id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of the currently authenticated user.
pub trait IdentityProvider: Send + Sync {
    /// The signed-in user, or `None` if nobody is signed in.
    fn current_user(&self) -> Option<UserId>;
}

/// Identity provider with a fixed answer.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user: Option<UserId>,
}

impl StaticIdentity {
    /// A provider reporting `user` as signed in.
    pub fn signed_in(user: impl Into<String>) -> Self {
        Self {
            user: Some(UserId::new(user)),
        }
    }

    /// A provider reporting nobody signed in.
    pub fn anonymous() -> Self {
        Self { user: None }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<UserId> {
        self.user.clone()
    }
}

/// Reject anonymous callers.
pub fn require_user(user: Option<&UserId>) -> Result<&UserId> {
    match user {
        Some(user) if !user.as_str().is_empty() => Ok(user),
        _ => Err(CatalogError::Unauthenticated),
    }
}
