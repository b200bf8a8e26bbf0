//! Command line front end for the Wairehouse tool directory.
//!
//! Usage: wairehouse --user <uid> vote --category "AI code generator" --tool <id> up

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use wairehouse_catalog::VoteChoice;

#[derive(Debug, Parser)]
#[command(name = "wairehouse", version, about = "Browse, vote on and collect AI tools")]
pub struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Act as this user (overrides the config file).
    #[arg(long, global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the profile record for a new user.
    Signup {
        #[arg(long)]
        email: String,
    },

    /// Load tools from a `{category: [{url, ...}]}` JSON file.
    Import { file: PathBuf },

    /// List tools by category, highest score first.
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Upvote or downvote a tool.
    Vote {
        #[arg(long)]
        category: String,
        #[arg(long)]
        tool: String,
        #[arg(value_enum)]
        choice: Choice,
    },

    /// Save a tool to a workbench (prompts for a name if none is given).
    Add {
        #[arg(long)]
        category: String,
        #[arg(long)]
        tool: String,
        #[arg(long)]
        workbench: Option<String>,
    },

    /// Remove a tool from a workbench.
    Remove {
        #[arg(long)]
        workbench: String,
        #[arg(long)]
        tool: String,
    },

    /// Delete a workbench.
    DeleteWorkbench { workbench: String },

    /// List your workbenches.
    Workbenches,

    /// List the tools saved in a workbench.
    Tools { workbench: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Choice {
    Up,
    Down,
}

impl From<Choice> for VoteChoice {
    fn from(choice: Choice) -> Self {
        match choice {
            Choice::Up => VoteChoice::Upvote,
            Choice::Down => VoteChoice::Downvote,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    commands::run(Cli::parse()).await
}
