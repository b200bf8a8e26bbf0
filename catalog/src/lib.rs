//! # Wairehouse Catalog
//!
//! This crate implements the tool directory behind Wairehouse:
//!
//! - **Catalog**: List AI tools grouped by category, ordered by score
//! - **Votes**: Let signed-in users upvote or downvote a tool
//! - **Workbenches**: Let users keep named collections of saved tools
//! - **Profiles**: Create the per-user record workbenches live in
//!
//! All persistence goes through a [`DocumentStore`], an opaque document
//! database that only offers whole-record reads and writes.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Wairehouse                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  Session ──► VoteLedger ───────┐                                │
//! │     │                          ▼                                │
//! │     └─────► WorkbenchManager ──► DocumentStore ◄── Catalog      │
//! │                                  (Memory / JsonFile)            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod identity;
pub mod profile;
pub mod session;
pub mod store;
pub mod tally;
pub mod tool;
pub mod votes;
pub mod workbench;

pub use catalog::{
    Catalog, CatalogFilter, CategoryListing, ImportSummary, PageView, display_name, paginate,
};
pub use config::CatalogConfig;
pub use error::{CatalogError, Result, StoreError};
pub use identity::{IdentityProvider, StaticIdentity, UserId};
pub use profile::{ProfileService, UserProfile};
pub use session::Session;
pub use store::{DocumentStore, JsonFileStore, MemoryStore};
pub use tally::{VoteTransition, WritePolicy};
pub use tool::{SavedTool, ToolRecord, ToolRef, VoteChoice};
pub use votes::{VoteLedger, VoteOutcome, VoteStatus};
pub use workbench::{AddOutcome, WorkbenchManager};
