//! Subcommand handlers.

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use tracing::warn;
use wairehouse_catalog::{
    Catalog, CatalogConfig, CatalogFilter, DocumentStore, JsonFileStore,
    ProfileService, SavedTool, Session, StaticIdentity, ToolRef, display_name, paginate,
};

use crate::{Cli, Command};

/// Ask on stdin for a workbench name.
fn prompt_workbench_name() -> Option<String> {
    print!("Enter a name for your workbench: ");
    std::io::stdout().flush().ok()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line).ok()?;
    Some(line.trim().to_string())
}

/// Rule violations are reported and end the command normally; store
/// failures become the process error.
fn settle<T>(result: wairehouse_catalog::Result<T>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_store_failure() => Err(e.into()),
        Err(_) => Ok(None),
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.unwrap_or_else(CatalogConfig::default_path);
    let config = CatalogConfig::load(&config_path)
        .await
        .with_context(|| format!("loading {}", config_path.display()))?;

    let store: Arc<dyn DocumentStore> = Arc::new(
        JsonFileStore::new(&config.data_dir)
            .await
            .with_context(|| format!("opening store at {}", config.data_dir.display()))?,
    );

    let identity = match cli.user.or_else(|| config.user.clone()) {
        Some(user) => StaticIdentity::signed_in(user),
        None => StaticIdentity::anonymous(),
    };
    let mut session = Session::new(&identity, store.clone(), config.write_policy);

    match cli.command {
        Command::Signup { email } => {
            let Some(user) = session.user().cloned() else {
                warn!("Sign-up needs a user id: pass --user or set `user` in the config");
                return Ok(());
            };
            ProfileService::new(store).sign_up(&user, &email).await?;
            println!("Registered {user}");
        }

        Command::Import { file } => {
            let content = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let data: serde_json::Value = serde_json::from_str(&content)?;
            let summary = Catalog::new(store).import(&data).await?;
            println!(
                "Imported {} tools into {} categories",
                summary.tools, summary.categories
            );
        }

        Command::List {
            category,
            search,
            page,
        } => {
            let mut filter = CatalogFilter::new().with_search(search);
            if let Some(category) = category {
                filter = filter.with_category(category);
            }
            let listings = Catalog::new(store).listing(&filter).await?;
            let view = paginate(&listings, page, config.page_size);

            for listing in &view.listings {
                println!("{}", listing.category);
                for tool in &listing.tools {
                    println!(
                        "  {:>5}  {:<24} {}  [{}]",
                        tool.votes,
                        display_name(&tool.url),
                        tool.url,
                        tool.id
                    );
                }
            }
            if view.has_more {
                println!("... more on page {}", page.max(1) + 1);
            }
        }

        Command::Vote {
            category,
            tool,
            choice,
        } => {
            let tool = ToolRef::new(category, tool);
            if let Some(status) = settle(session.vote(&tool, choice.into()).await)? {
                println!("{tool}: {} votes", status.votes);
            }
        }

        Command::Add {
            category,
            tool,
            workbench,
        } => {
            let tool = ToolRef::new(category, tool);
            let Some(record) = settle(Catalog::new(store).tool(&tool).await)? else {
                warn!("No tool {tool} in the catalog");
                return Ok(());
            };
            let saved = SavedTool::from_record(&tool, &record);
            let outcome = settle(
                session
                    .add_to_workbench(workbench.as_deref(), saved, prompt_workbench_name)
                    .await,
            )?;
            if let Some(outcome) = outcome {
                println!(
                    "{} now holds {} tools",
                    outcome.workbench,
                    outcome.tools.len()
                );
            }
        }

        Command::Remove { workbench, tool } => {
            if settle(session.select_workbench(Some(&workbench)).await)?.is_none() {
                return Ok(());
            }
            if let Some(tools) = settle(session.remove_from_active(&tool).await)? {
                println!("{workbench} now holds {} tools", tools.len());
            }
        }

        Command::DeleteWorkbench { workbench } => {
            if settle(session.select_workbench(Some(&workbench)).await)?.is_none() {
                return Ok(());
            }
            if settle(session.delete_active().await)?.is_some() {
                println!("Deleted {workbench}");
            }
        }

        Command::Workbenches => {
            if let Some(names) = settle(session.refresh_workbenches().await)? {
                for name in names {
                    println!("{name}");
                }
            }
        }

        Command::Tools { workbench } => {
            if let Some(tools) = settle(session.select_workbench(Some(&workbench)).await)? {
                for tool in tools {
                    println!(
                        "{:<24} {:<24} {}",
                        display_name(&tool.url),
                        tool.category,
                        tool.url
                    );
                }
            }
        }
    }

    Ok(())
}
