//! Core tool types.
//!
//! A tool is a listed AI product, identified by its category and an id
//! within that category. Its score record carries the aggregate vote count
//! and the ledger of each user's last choice.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::UserId;

/// Reference to a tool score record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolRef {
    /// Category the tool is listed under.
    pub category: String,

    /// Tool id within the category.
    pub id: String,
}

impl ToolRef {
    /// Create a new tool reference.
    pub fn new(category: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for ToolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.id)
    }
}

/// A user's vote on a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    Upvote,
    Downvote,
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upvote => write!(f, "upvote"),
            Self::Downvote => write!(f, "downvote"),
        }
    }
}

/// Persisted score record for one tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRecord {
    /// Tool homepage.
    #[serde(default)]
    pub url: String,

    /// Aggregate score. Signed, no floor.
    #[serde(default)]
    pub votes: i64,

    /// Last recorded choice per user.
    #[serde(default)]
    pub user_votes: BTreeMap<UserId, VoteChoice>,

    /// Fields written at ingestion time that this crate does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ToolRecord {
    /// Create a fresh record with no votes.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// The user's recorded choice, if any.
    pub fn choice_of(&self, user: &UserId) -> Option<VoteChoice> {
        self.user_votes.get(user).copied()
    }

    /// Recompute the score from the ledger.
    pub fn ledger_total(&self) -> i64 {
        self.user_votes
            .values()
            .map(|choice| match choice {
                VoteChoice::Upvote => 1,
                VoteChoice::Downvote => -1,
            })
            .sum()
    }
}

/// A tool entry saved inside a workbench.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedTool {
    /// Tool id.
    pub id: String,

    /// Tool homepage.
    pub url: String,

    /// Score at the time the tool was saved.
    pub votes: i64,

    /// Category the tool is listed under.
    pub category: String,
}

impl SavedTool {
    /// Snapshot a listed tool for saving.
    pub fn from_record(tool: &ToolRef, record: &ToolRecord) -> Self {
        Self {
            id: tool.id.clone(),
            url: record.url.clone(),
            votes: record.votes,
            category: tool.category.clone(),
        }
    }

    /// Reference back to the tool's score record.
    pub fn tool_ref(&self) -> ToolRef {
        ToolRef::new(self.category.clone(), self.id.clone())
    }
}
