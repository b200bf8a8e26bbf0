//! User profiles.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CatalogError, Result};
use crate::identity::UserId;
use crate::store::{DocPath, DocumentStore, Precondition, WriteMode, from_document, to_document};
use crate::tool::SavedTool;

/// Workbench name to its ordered tool entries.
pub type Workbenches = BTreeMap<String, Vec<SavedTool>>;

/// Persisted profile of one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// User id. Profiles are keyed by the user id, not by this field.
    #[serde(default)]
    pub uid: UserId,

    /// Sign-up email.
    #[serde(default)]
    pub email: String,

    /// When the profile was created, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// The user's workbenches.
    #[serde(default)]
    pub workbenches: Workbenches,

    /// Fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserProfile {
    /// A fresh profile with no workbenches.
    pub fn new(uid: UserId, email: impl Into<String>) -> Self {
        Self {
            uid,
            email: email.into(),
            created_at: Some(Utc::now()),
            workbenches: Workbenches::new(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Creates and reads user profiles.
pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create the profile record for a newly registered user.
    pub async fn sign_up(&self, uid: &UserId, email: &str) -> Result<UserProfile> {
        let email = email.trim();
        if email.is_empty() {
            return Err(CatalogError::InvalidRecord("email is required".to_string()));
        }

        let path = DocPath::user(uid.as_str())?;
        if self.store.read(&path).await?.is_some() {
            return Err(CatalogError::InvalidRecord(format!(
                "profile for {uid} already exists"
            )));
        }

        let profile = UserProfile::new(uid.clone(), email);
        // Version 0 means "must not exist yet".
        self.store
            .write(
                &path,
                to_document(&profile)?,
                WriteMode::Replace,
                Precondition::Version(0),
            )
            .await?;

        info!("Registered user {uid}");
        Ok(profile)
    }

    /// Read a profile, `None` if the user has none.
    pub async fn get(&self, uid: &UserId) -> Result<Option<UserProfile>> {
        let path = DocPath::user(uid.as_str())?;
        match self.store.read(&path).await? {
            Some(snapshot) => Ok(Some(from_document(snapshot.data)?)),
            None => Ok(None),
        }
    }
}
