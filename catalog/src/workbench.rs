//! Workbench management.
//!
//! A workbench is a user-owned, named, ordered collection of saved tools.
//! Every mutation reads the user's profile, edits the workbench mapping
//! locally and writes the profile back.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{CatalogError, Result};
use crate::identity::{UserId, require_user};
use crate::profile::{UserProfile, Workbenches};
use crate::store::{
    DocPath, Document, DocumentStore, Snapshot, WriteMode, from_document, to_document,
};
use crate::tally::WritePolicy;
use crate::tool::SavedTool;

/// Pick the workbench name for an add: the selected one if any, otherwise
/// whatever `prompt` returns.
pub fn resolve_name(
    selected: Option<&str>,
    prompt: impl FnOnce() -> Option<String>,
) -> Result<String> {
    let selected = selected.map(str::trim).filter(|name| !name.is_empty());
    if let Some(name) = selected {
        return Ok(name.to_string());
    }

    prompt()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or(CatalogError::NameRequired)
}

/// Result of adding a tool to a workbench.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    /// Workbench the tool was added to.
    pub workbench: String,

    /// Whether the workbench was created by this add.
    pub created: bool,

    /// The workbench's tools after the add.
    pub tools: Vec<SavedTool>,
}

/// Manages the workbenches stored in user profiles.
pub struct WorkbenchManager {
    store: Arc<dyn DocumentStore>,
    policy: WritePolicy,
}

impl WorkbenchManager {
    /// Create a manager over the given store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            policy: WritePolicy::default(),
        }
    }

    /// Set the write policy.
    pub fn with_policy(mut self, policy: WritePolicy) -> Self {
        self.policy = policy;
        self
    }

    async fn read_profile(&self, user: &UserId) -> Result<Option<(UserProfile, Snapshot)>> {
        let path = DocPath::user(user.as_str())?;
        match self.store.read(&path).await? {
            Some(snapshot) => {
                let profile: UserProfile = from_document(snapshot.data.clone())?;
                Ok(Some((profile, snapshot)))
            }
            None => Ok(None),
        }
    }

    async fn require_profile(&self, user: &UserId) -> Result<(UserProfile, Snapshot)> {
        self.read_profile(user)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("profile for {user}")))
    }

    async fn write_profile(
        &self,
        user: &UserId,
        profile: &UserProfile,
        snapshot: &Snapshot,
        mode: WriteMode,
    ) -> Result<()> {
        let path = DocPath::user(user.as_str())?;
        let document = match mode {
            WriteMode::Replace => to_document(profile)?,
            WriteMode::Merge => {
                let mut document = Document::new();
                document.insert(
                    "workbenches".to_string(),
                    serde_json::to_value(&profile.workbenches)?,
                );
                document
            }
        };

        self.store
            .write(&path, document, mode, self.policy.precondition(Some(snapshot)))
            .await?;
        Ok(())
    }

    /// Append `tool` to the named workbench, creating the workbench if needed.
    ///
    /// Fails with [`CatalogError::DuplicateTool`] without writing if the
    /// workbench already holds a tool with the same id.
    pub async fn add_tool(
        &self,
        user: Option<&UserId>,
        workbench: Option<&str>,
        tool: SavedTool,
    ) -> Result<AddOutcome> {
        let user = require_user(user)?;
        let name = workbench
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(CatalogError::NameRequired)?
            .to_string();

        let (mut profile, snapshot) = self.require_profile(user).await?;

        let created = !profile.workbenches.contains_key(&name);
        let tools = profile.workbenches.entry(name.clone()).or_default();
        if tools.iter().any(|saved| saved.id == tool.id) {
            warn!("Tool {} already in workbench {name} of {user}", tool.id);
            return Err(CatalogError::DuplicateTool {
                workbench: name,
                tool_id: tool.id,
            });
        }

        let tool_id = tool.id.clone();
        tools.push(tool);
        let tools = tools.clone();

        self.write_profile(user, &profile, &snapshot, WriteMode::Merge)
            .await?;

        if created {
            info!("Created workbench {name} for {user}");
        }
        info!("Added tool {tool_id} to workbench {name}");

        Ok(AddOutcome {
            workbench: name,
            created,
            tools,
        })
    }

    /// Remove the tool with `tool_id` from the named workbench.
    ///
    /// Removing a tool that is not there is a no-op.
    pub async fn remove_tool(
        &self,
        user: Option<&UserId>,
        workbench: &str,
        tool_id: &str,
    ) -> Result<Vec<SavedTool>> {
        let user = require_user(user)?;
        let (mut profile, snapshot) = self.require_profile(user).await?;

        let tools = profile
            .workbenches
            .get_mut(workbench)
            .ok_or_else(|| CatalogError::NotFound(format!("workbench {workbench}")))?;

        let Some(position) = tools.iter().position(|saved| saved.id == tool_id) else {
            debug!("Tool {tool_id} not in workbench {workbench}, nothing to remove");
            return Ok(tools.clone());
        };
        tools.remove(position);
        let tools = tools.clone();

        self.write_profile(user, &profile, &snapshot, WriteMode::Replace)
            .await?;

        info!("Removed tool {tool_id} from workbench {workbench}");
        Ok(tools)
    }

    /// Delete the named workbench from the user's profile.
    pub async fn delete_workbench(&self, user: Option<&UserId>, workbench: &str) -> Result<()> {
        let user = require_user(user)?;
        let (mut profile, snapshot) = self.require_profile(user).await?;

        if profile.workbenches.remove(workbench).is_none() {
            return Err(CatalogError::NotFound(format!("workbench {workbench}")));
        }

        self.write_profile(user, &profile, &snapshot, WriteMode::Replace)
            .await?;

        info!("Deleted workbench {workbench} of {user}");
        Ok(())
    }

    /// Names of the user's workbenches, empty if there is no profile.
    pub async fn list_workbenches(&self, user: Option<&UserId>) -> Result<Vec<String>> {
        Ok(self.workbenches(user).await?.into_keys().collect())
    }

    /// Tools in the named workbench, empty if the user or workbench is absent.
    pub async fn list_tools(&self, user: Option<&UserId>, workbench: &str) -> Result<Vec<SavedTool>> {
        Ok(self
            .workbenches(user)
            .await?
            .remove(workbench)
            .unwrap_or_default())
    }

    async fn workbenches(&self, user: Option<&UserId>) -> Result<Workbenches> {
        let Some(user) = user else {
            return Ok(Workbenches::new());
        };
        Ok(self
            .read_profile(user)
            .await?
            .map(|(profile, _)| profile.workbenches)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::profile::ProfileService;
    use crate::store::{CollectionPath, MemoryStore, Precondition};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn saved(id: &str) -> SavedTool {
        SavedTool {
            id: id.to_string(),
            url: format!("https://{id}.ai"),
            votes: 0,
            category: "AI chatbot creator".to_string(),
        }
    }

    async fn manager_with_user(uid: &str) -> (WorkbenchManager, UserId) {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let user = UserId::new(uid);
        ProfileService::new(store.clone())
            .sign_up(&user, "user@example.com")
            .await
            .unwrap();
        (WorkbenchManager::new(store), user)
    }

    async fn seed_profile(store: &MemoryStore, uid: &str, body: serde_json::Value) {
        let serde_json::Value::Object(document) = body else {
            panic!("profile body must be an object");
        };
        store
            .write(
                &DocPath::user(uid).unwrap(),
                document,
                WriteMode::Replace,
                Precondition::None,
            )
            .await
            .unwrap();
    }

    async fn profile_version(store: &dyn DocumentStore, uid: &str) -> u64 {
        store
            .read(&DocPath::user(uid).unwrap())
            .await
            .unwrap()
            .unwrap()
            .version
    }

    #[test]
    fn test_resolve_name() {
        assert_eq!(resolve_name(Some("w"), || None).unwrap(), "w");
        assert_eq!(
            resolve_name(None, || Some(" prompted ".to_string())).unwrap(),
            "prompted"
        );
        assert_eq!(
            resolve_name(Some("  "), || Some("fallback".to_string())).unwrap(),
            "fallback"
        );
        assert!(matches!(
            resolve_name(None, || Some(String::new())),
            Err(CatalogError::NameRequired)
        ));
    }

    #[tokio::test]
    async fn test_add_creates_workbench() {
        let (manager, user) = manager_with_user("u1").await;

        let outcome = manager
            .add_tool(Some(&user), Some("new-wb"), saved("x"))
            .await
            .unwrap();
        assert!(outcome.created);
        assert_eq!(outcome.tools, vec![saved("x")]);

        let second = manager
            .add_tool(Some(&user), Some("new-wb"), saved("y"))
            .await
            .unwrap();
        assert!(!second.created);
        assert_eq!(
            manager.list_tools(Some(&user), "new-wb").await.unwrap(),
            vec![saved("x"), saved("y")]
        );
    }

    #[tokio::test]
    async fn test_add_requires_name() {
        let (manager, user) = manager_with_user("u1").await;
        let result = manager.add_tool(Some(&user), None, saved("x")).await;
        assert!(matches!(result, Err(CatalogError::NameRequired)));
        assert!(manager.list_workbenches(Some(&user)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_without_profile() {
        let manager = WorkbenchManager::new(Arc::new(MemoryStore::new()));
        let result = manager
            .add_tool(Some(&UserId::new("ghost")), Some("w"), saved("x"))
            .await;
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_keeps_order() {
        let (manager, user) = manager_with_user("u1").await;
        for id in ["a", "b", "c"] {
            manager.add_tool(Some(&user), Some("w"), saved(id)).await.unwrap();
        }

        let tools = manager.remove_tool(Some(&user), "w", "b").await.unwrap();
        assert_eq!(tools, vec![saved("a"), saved("c")]);
    }

    #[tokio::test]
    async fn test_remove_from_missing_workbench() {
        let (manager, user) = manager_with_user("u1").await;
        let result = manager.remove_tool(Some(&user), "nope", "a").await;
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_leaves_other_workbenches() {
        let (manager, user) = manager_with_user("u1").await;
        manager.add_tool(Some(&user), Some("keep"), saved("a")).await.unwrap();
        manager.add_tool(Some(&user), Some("drop"), saved("b")).await.unwrap();

        manager.delete_workbench(Some(&user), "drop").await.unwrap();

        assert_eq!(
            manager.list_workbenches(Some(&user)).await.unwrap(),
            vec!["keep".to_string()]
        );
        assert!(matches!(
            manager.delete_workbench(Some(&user), "drop").await,
            Err(CatalogError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reads_for_absent_user() {
        let manager = WorkbenchManager::new(Arc::new(MemoryStore::new()));
        assert!(manager.list_workbenches(None).await.unwrap().is_empty());
        assert!(
            manager
                .list_tools(Some(&UserId::new("ghost")), "w")
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_mutations_require_user() {
        let manager = WorkbenchManager::new(Arc::new(MemoryStore::new()));
        assert!(matches!(
            manager.add_tool(None, Some("w"), saved("x")).await,
            Err(CatalogError::Unauthenticated)
        ));
        assert!(matches!(
            manager.remove_tool(None, "w", "x").await,
            Err(CatalogError::Unauthenticated)
        ));
        assert!(matches!(
            manager.delete_workbench(None, "w").await,
            Err(CatalogError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_add_does_not_write() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new("u1");
        ProfileService::new(store.clone())
            .sign_up(&user, "user@example.com")
            .await
            .unwrap();
        let manager = WorkbenchManager::new(store.clone());
        manager.add_tool(Some(&user), Some("w"), saved("x")).await.unwrap();
        let version = profile_version(store.as_ref(), "u1").await;

        let again = manager.add_tool(Some(&user), Some("w"), saved("x")).await;

        assert!(matches!(again, Err(CatalogError::DuplicateTool { .. })));
        assert_eq!(profile_version(store.as_ref(), "u1").await, version);
    }

    #[tokio::test]
    async fn test_remove_absent_tool_does_not_write() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new("u1");
        ProfileService::new(store.clone())
            .sign_up(&user, "user@example.com")
            .await
            .unwrap();
        let manager = WorkbenchManager::new(store.clone());
        manager.add_tool(Some(&user), Some("w"), saved("x")).await.unwrap();
        let version = profile_version(store.as_ref(), "u1").await;

        let tools = manager.remove_tool(Some(&user), "w", "absent").await.unwrap();

        assert_eq!(tools, vec![saved("x")]);
        assert_eq!(profile_version(store.as_ref(), "u1").await, version);
    }

    #[tokio::test]
    async fn test_replace_writes_keep_unknown_profile_fields() {
        let store = Arc::new(MemoryStore::new());
        seed_profile(
            &store,
            "u1",
            json!({
                "uid": "u1",
                "email": "a@b.c",
                "displayName": "Ada",
                "workbenches": {"w": [saved("x")], "old": []}
            }),
        )
        .await;
        let manager = WorkbenchManager::new(store.clone());
        let user = UserId::new("u1");

        manager.remove_tool(Some(&user), "w", "x").await.unwrap();
        manager.delete_workbench(Some(&user), "old").await.unwrap();

        let stored = store
            .read(&DocPath::user("u1").unwrap())
            .await
            .unwrap()
            .unwrap()
            .data;
        assert_eq!(stored.get("displayName"), Some(&json!("Ada")));
        assert_eq!(stored.get("workbenches"), Some(&json!({"w": []})));
        assert!(stored.get("createdAt").is_none());
    }

    #[tokio::test]
    async fn test_writes_go_to_acting_user() {
        let store = Arc::new(MemoryStore::new());
        seed_profile(&store, "u1", json!({"uid": "other", "workbenches": {}})).await;
        seed_profile(&store, "u2", json!({"email": "no-uid@example.com"})).await;
        let manager = WorkbenchManager::new(store.clone());

        let u1 = UserId::new("u1");
        manager.add_tool(Some(&u1), Some("w"), saved("x")).await.unwrap();
        assert_eq!(manager.list_tools(Some(&u1), "w").await.unwrap(), vec![saved("x")]);
        assert!(
            store
                .read(&DocPath::user("other").unwrap())
                .await
                .unwrap()
                .is_none()
        );

        let u2 = UserId::new("u2");
        manager.add_tool(Some(&u2), Some("w"), saved("y")).await.unwrap();
        assert_eq!(manager.list_tools(Some(&u2), "w").await.unwrap(), vec![saved("y")]);
    }

    /// Store that rewrites the profile between the manager's read and write.
    struct RacingStore {
        inner: MemoryStore,
    }

    #[async_trait::async_trait]
    impl DocumentStore for RacingStore {
        async fn read(
            &self,
            path: &DocPath,
        ) -> std::result::Result<Option<Snapshot>, StoreError> {
            let snapshot = self.inner.read(path).await?;
            if let Some(snapshot) = &snapshot {
                self.inner
                    .write(path, snapshot.data.clone(), WriteMode::Replace, Precondition::None)
                    .await?;
            }
            Ok(snapshot)
        }

        async fn write(
            &self,
            path: &DocPath,
            document: Document,
            mode: WriteMode,
            precondition: Precondition,
        ) -> std::result::Result<u64, StoreError> {
            self.inner.write(path, document, mode, precondition).await
        }

        async fn list(
            &self,
            collection: &CollectionPath,
        ) -> std::result::Result<Vec<(String, Snapshot)>, StoreError> {
            self.inner.list(collection).await
        }
    }

    #[tokio::test]
    async fn test_check_version_reports_workbench_conflict() {
        let inner = MemoryStore::new();
        seed_profile(&inner, "u1", json!({"uid": "u1", "workbenches": {"w": [saved("x")]}}))
            .await;
        let manager = WorkbenchManager::new(Arc::new(RacingStore { inner }))
            .with_policy(WritePolicy::CheckVersion);
        let user = UserId::new("u1");

        let add = manager.add_tool(Some(&user), Some("w"), saved("y")).await;
        assert!(matches!(
            add,
            Err(CatalogError::Store(StoreError::Conflict { .. }))
        ));

        let remove = manager.remove_tool(Some(&user), "w", "x").await;
        assert!(matches!(
            remove,
            Err(CatalogError::Store(StoreError::Conflict { .. }))
        ));

        let delete = manager.delete_workbench(Some(&user), "w").await;
        assert!(matches!(
            delete,
            Err(CatalogError::Store(StoreError::Conflict { .. }))
        ));
    }
}
