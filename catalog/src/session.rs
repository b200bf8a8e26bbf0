//! Client-side session state.
//!
//! A `Session` caches what the user currently sees: their workbench names,
//! the selected workbench and its tools, and the last known score of each
//! tool they looked at. The cache only changes after the store confirms a
//! write; failed operations are logged and leave it as it was.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, warn};

use crate::error::Result;
use crate::identity::{IdentityProvider, UserId};
use crate::store::DocumentStore;
use crate::tally::WritePolicy;
use crate::tool::{SavedTool, ToolRef, VoteChoice};
use crate::votes::{VoteLedger, VoteStatus};
use crate::workbench::{AddOutcome, WorkbenchManager, resolve_name};

fn report<T>(operation: &str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        if e.is_store_failure() {
            error!("Error {operation}: {e}");
        } else {
            warn!("Could not {operation}: {e}");
        }
    }
    result
}

/// Cached view of one user's catalog interactions.
pub struct Session {
    user: Option<UserId>,
    ledger: VoteLedger,
    manager: WorkbenchManager,
    workbench_names: Vec<String>,
    active: Option<String>,
    active_tools: Vec<SavedTool>,
    tallies: HashMap<ToolRef, VoteStatus>,
}

impl Session {
    /// Start a session for whoever `identity` reports as signed in.
    pub fn new(
        identity: &dyn IdentityProvider,
        store: Arc<dyn DocumentStore>,
        policy: WritePolicy,
    ) -> Self {
        Self {
            user: identity.current_user(),
            ledger: VoteLedger::new(store.clone()).with_policy(policy),
            manager: WorkbenchManager::new(store).with_policy(policy),
            workbench_names: Vec::new(),
            active: None,
            active_tools: Vec::new(),
            tallies: HashMap::new(),
        }
    }

    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    pub fn workbench_names(&self) -> &[String] {
        &self.workbench_names
    }

    pub fn active_workbench(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_tools(&self) -> &[SavedTool] {
        &self.active_tools
    }

    /// Last confirmed score of a tool.
    pub fn tally(&self, tool: &ToolRef) -> Option<VoteStatus> {
        self.tallies.get(tool).copied()
    }

    /// Reload the workbench names from the store.
    pub async fn refresh_workbenches(&mut self) -> Result<&[String]> {
        let names = report(
            "fetch user workbenches",
            self.manager.list_workbenches(self.user.as_ref()).await,
        )?;
        self.workbench_names = names;
        Ok(&self.workbench_names)
    }

    /// Select a workbench (or none) and load its tools.
    pub async fn select_workbench(&mut self, name: Option<&str>) -> Result<&[SavedTool]> {
        let tools = match name {
            Some(name) => report(
                "fetch tools in workbench",
                self.manager.list_tools(self.user.as_ref(), name).await,
            )?,
            None => Vec::new(),
        };
        self.active = name.map(str::to_string);
        self.active_tools = tools;
        Ok(&self.active_tools)
    }

    /// Load a tool's score for display.
    pub async fn load_tally(&mut self, tool: &ToolRef) -> Result<VoteStatus> {
        let status = report(
            "fetch votes",
            self.ledger.status(tool, self.user.as_ref()).await,
        )?;
        self.tallies.insert(tool.clone(), status);
        Ok(status)
    }

    /// Vote on a tool.
    pub async fn vote(&mut self, tool: &ToolRef, choice: VoteChoice) -> Result<VoteStatus> {
        let outcome = report(
            "update vote",
            self.ledger.cast_vote(tool, self.user.as_ref(), choice).await,
        )?;
        let status = VoteStatus::from(outcome);
        self.tallies.insert(tool.clone(), status);
        Ok(status)
    }

    /// Add a tool to the selected workbench, asking `prompt` for a name if
    /// none is selected.
    pub async fn add_to_workbench(
        &mut self,
        selected: Option<&str>,
        tool: SavedTool,
        prompt: impl FnOnce() -> Option<String>,
    ) -> Result<AddOutcome> {
        if self.user.is_none() {
            return report(
                "add tool to workbench",
                self.manager.add_tool(None, selected, tool).await,
            );
        }

        let name = report("add tool to workbench", resolve_name(selected, prompt))?;
        let outcome = report(
            "add tool to workbench",
            self.manager
                .add_tool(self.user.as_ref(), Some(&name), tool)
                .await,
        )?;

        if outcome.created && !self.workbench_names.contains(&outcome.workbench) {
            self.workbench_names.push(outcome.workbench.clone());
        }
        if self.active.as_deref() == Some(outcome.workbench.as_str()) {
            self.active_tools = outcome.tools.clone();
        }
        Ok(outcome)
    }

    /// Remove a tool from the selected workbench.
    pub async fn remove_from_active(&mut self, tool_id: &str) -> Result<&[SavedTool]> {
        let Some(active) = self.active.clone() else {
            return Ok(&self.active_tools);
        };
        let tools = report(
            "remove tool from workbench",
            self.manager
                .remove_tool(self.user.as_ref(), &active, tool_id)
                .await,
        )?;
        self.active_tools = tools;
        Ok(&self.active_tools)
    }

    /// Delete the selected workbench and clear the selection.
    pub async fn delete_active(&mut self) -> Result<()> {
        let Some(active) = self.active.clone() else {
            return Ok(());
        };
        report(
            "delete workbench",
            self.manager
                .delete_workbench(self.user.as_ref(), &active)
                .await,
        )?;

        self.workbench_names.retain(|name| name != &active);
        self.active = None;
        self.active_tools.clear();
        Ok(())
    }
}
