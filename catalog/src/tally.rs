//! Score arithmetic and the write policy for read-modify-write updates.
//!
//! Both managers read a whole record, compute the new value locally and
//! write the whole record back. Nothing here is atomic on its own;
//! [`WritePolicy::CheckVersion`] turns the write into a compare-and-swap
//! against the version that was read.

use serde::{Deserialize, Serialize};

use crate::store::{Precondition, Snapshot};
use crate::tool::VoteChoice;

/// A change of a user's recorded vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteTransition {
    /// Previously recorded choice, `None` if the user never voted.
    pub previous: Option<VoteChoice>,

    /// Choice being cast.
    pub next: VoteChoice,
}

impl VoteTransition {
    pub fn new(previous: Option<VoteChoice>, next: VoteChoice) -> Self {
        Self { previous, next }
    }

    /// Signed adjustment to the aggregate score, `None` for a repeat vote.
    pub fn delta(&self) -> Option<i64> {
        use VoteChoice::{Downvote, Upvote};

        match (self.previous, self.next) {
            (None, Upvote) => Some(1),
            (None, Downvote) => Some(-1),
            (Some(Downvote), Upvote) => Some(2),
            (Some(Upvote), Downvote) => Some(-2),
            (Some(Upvote), Upvote) | (Some(Downvote), Downvote) => None,
        }
    }
}

/// Apply a vote delta to the current total.
pub fn apply_delta(current: i64, delta: i64) -> i64 {
    current.saturating_add(delta)
}

/// How the write half of a read-modify-write is issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Write unconditionally; a concurrent writer's update may be lost.
    #[default]
    LastWriterWins,

    /// Reject the write if the record changed since it was read.
    CheckVersion,
}

impl WritePolicy {
    /// Precondition for writing back a record read as `snapshot`.
    pub fn precondition(self, snapshot: Option<&Snapshot>) -> Precondition {
        match self {
            Self::LastWriterWins => Precondition::None,
            Self::CheckVersion => Precondition::Version(snapshot.map_or(0, |s| s.version)),
        }
    }
}
