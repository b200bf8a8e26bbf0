//! Vote ledger.
//!
//! The `VoteLedger` applies upvote/downvote transitions to a tool's
//! aggregate score while recording each user's current choice, so that
//! repeating a vote is a no-op and switching sides moves the score by two.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{CatalogError, Result};
use crate::identity::{UserId, require_user};
use crate::store::{DocPath, DocumentStore, Snapshot, WriteMode, from_document, to_document};
use crate::tally::{VoteTransition, WritePolicy, apply_delta};
use crate::tool::{ToolRecord, ToolRef, VoteChoice};

/// Current score of a tool as seen by one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteStatus {
    /// Aggregate score.
    pub votes: i64,

    /// The viewing user's recorded choice.
    pub choice: Option<VoteChoice>,
}

/// Result of casting a vote, confirmed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    /// Aggregate score after the vote.
    pub votes: i64,

    /// The user's recorded choice after the vote.
    pub choice: VoteChoice,

    /// Whether a write happened (false for a repeat vote).
    pub changed: bool,
}

impl From<VoteOutcome> for VoteStatus {
    fn from(outcome: VoteOutcome) -> Self {
        Self {
            votes: outcome.votes,
            choice: Some(outcome.choice),
        }
    }
}

/// Applies votes to tool score records.
pub struct VoteLedger {
    store: Arc<dyn DocumentStore>,
    policy: WritePolicy,
}

impl VoteLedger {
    /// Create a ledger over the given store.
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

    async fn load(&self, tool: &ToolRef) -> Result<(ToolRecord, Snapshot)> {
        let path = DocPath::tool(&tool.category, &tool.id)?;
        let snapshot = self
            .store
            .read(&path)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("tool {tool}")))?;
        let record: ToolRecord = from_document(snapshot.data.clone())?;
        Ok((record, snapshot))
    }

    /// Read the score and, if a user is given, their recorded choice.
    pub async fn status(&self, tool: &ToolRef, user: Option<&UserId>) -> Result<VoteStatus> {
        let (record, _) = self.load(tool).await?;
        Ok(VoteStatus {
            votes: record.votes,
            choice: user.and_then(|u| record.choice_of(u)),
        })
    }

    /// Cast `choice` for `user` on `tool`.
    ///
    /// A repeat of the user's recorded choice is a no-op. Otherwise the
    /// score moves by the transition delta and the record is written back
    /// whole.
    pub async fn cast_vote(
        &self,
        tool: &ToolRef,
        user: Option<&UserId>,
        choice: VoteChoice,
    ) -> Result<VoteOutcome> {
        let user = require_user(user)?;
        let (mut record, snapshot) = self.load(tool).await?;

        let transition = VoteTransition::new(record.choice_of(user), choice);
        let Some(delta) = transition.delta() else {
            debug!("Repeat {choice} by {user} on {tool}, nothing to write");
            return Ok(VoteOutcome {
                votes: record.votes,
                choice,
                changed: false,
            });
        };

        record.votes = apply_delta(record.votes, delta);
        record.user_votes.insert(user.clone(), choice);

        let path = DocPath::tool(&tool.category, &tool.id)?;
        self.store
            .write(
                &path,
                to_document(&record)?,
                WriteMode::Replace,
                self.policy.precondition(Some(&snapshot)),
            )
            .await?;

        info!("{user} cast {choice} on {tool}: {delta:+} -> {}", record.votes);

        Ok(VoteOutcome {
            votes: record.votes,
            choice,
            changed: true,
        })
    }
}
