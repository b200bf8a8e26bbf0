//! Tool catalog listing and ingestion.
//!
//! Tools are stored per category under `tools/<category>/urls/<id>`. The
//! `Catalog` loads every category, orders each one by score, filters by
//! category and search text, and pages through the result the way an
//! infinitely scrolling list does.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{CatalogError, Result};
use crate::store::{
    CollectionPath, DocPath, Document, DocumentStore, Precondition, WriteMode, from_document,
    to_document,
};
use crate::tool::{SavedTool, ToolRecord, ToolRef};

/// Tools of one category, highest score first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryListing {
    /// Category name.
    pub category: String,

    /// Tools in the category.
    pub tools: Vec<SavedTool>,
}

/// Listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    /// Only show this category.
    pub category: Option<String>,

    /// Case-insensitive substring of the tool URL.
    pub search: String,
}

impl CatalogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the search text.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Whether a tool passes the filter.
    pub fn matches(&self, tool: &SavedTool) -> bool {
        let category_ok = self
            .category
            .as_deref()
            .is_none_or(|category| tool.category == category);
        let search_ok = tool
            .url
            .to_lowercase()
            .contains(&self.search.to_lowercase());
        category_ok && search_ok
    }

    /// Filter listings, dropping categories left empty.
    pub fn apply(&self, listings: Vec<CategoryListing>) -> Vec<CategoryListing> {
        listings
            .into_iter()
            .filter_map(|listing| {
                let tools: Vec<_> = listing
                    .tools
                    .into_iter()
                    .filter(|tool| self.matches(tool))
                    .collect();
                (!tools.is_empty()).then(|| CategoryListing {
                    category: listing.category,
                    tools,
                })
            })
            .collect()
    }
}

/// The tools visible after scrolling to a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    /// Listings truncated to the page.
    pub listings: Vec<CategoryListing>,

    /// Whether further pages hold more tools.
    pub has_more: bool,
}

/// Show everything up to and including 1-based `page`.
pub fn paginate(listings: &[CategoryListing], page: usize, page_size: usize) -> PageView {
    let mut remaining = page.max(1).saturating_mul(page_size);
    let total: usize = listings.iter().map(|l| l.tools.len()).sum();
    let mut visible = Vec::new();

    for listing in listings {
        if remaining == 0 {
            break;
        }
        let take = listing.tools.len().min(remaining);
        remaining -= take;
        visible.push(CategoryListing {
            category: listing.category.clone(),
            tools: listing.tools[..take].to_vec(),
        });
    }

    let shown: usize = visible.iter().map(|l| l.tools.len()).sum();
    PageView {
        listings: visible,
        has_more: shown < total,
    }
}

/// Human-readable name for a tool URL: its hostname without `www.`,
/// first letter capitalised.
pub fn display_name(url: &str) -> String {
    let Some(host) = url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
    else {
        return url.to_string();
    };

    let host = host.strip_prefix("www.").unwrap_or(&host);
    let mut chars = host.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => url.to_string(),
    }
}

/// Counts from an import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Categories touched.
    pub categories: usize,

    /// Tool records created.
    pub tools: usize,
}

/// Read access to the tool catalog plus bulk ingestion.
pub struct Catalog {
    store: Arc<dyn DocumentStore>,
}

impl Catalog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Load every category with its tools, highest score first.
    pub async fn load(&self) -> Result<Vec<CategoryListing>> {
        let categories = self.store.list(&CollectionPath::root("tools")?).await?;
        let mut listings = Vec::with_capacity(categories.len());

        for (category, _) in categories {
            let parent = DocPath::category(&category)?;
            let mut tools = Vec::new();

            for (id, snapshot) in self.store.read_subcollection(&parent, "urls").await? {
                match from_document::<ToolRecord>(snapshot.data) {
                    Ok(record) => {
                        tools.push(SavedTool::from_record(&ToolRef::new(&category, id), &record));
                    }
                    Err(e) => warn!("Skipping unreadable tool {category}/{id}: {e}"),
                }
            }

            tools.sort_by(|a, b| b.votes.cmp(&a.votes).then_with(|| a.id.cmp(&b.id)));
            debug!("Loaded {} tools in {category}", tools.len());
            listings.push(CategoryListing { category, tools });
        }

        Ok(listings)
    }

    /// Load and filter.
    pub async fn listing(&self, filter: &CatalogFilter) -> Result<Vec<CategoryListing>> {
        Ok(filter.apply(self.load().await?))
    }

    /// Read a single tool record.
    pub async fn tool(&self, tool: &ToolRef) -> Result<ToolRecord> {
        let path = DocPath::tool(&tool.category, &tool.id)?;
        let snapshot = self
            .store
            .read(&path)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("tool {tool}")))?;
        from_document(snapshot.data)
    }

    /// Ingest `{category: [{url, ...}, ...]}`.
    ///
    /// Each entry becomes a new tool record with a fresh id and no votes.
    /// Fields other than `url` are kept as-is. Every entry is checked before
    /// anything is written.
    pub async fn import(&self, data: &serde_json::Value) -> Result<ImportSummary> {
        let categories: BTreeMap<String, Vec<Document>> = serde_json::from_value(data.clone())?;
        let mut batches = Vec::with_capacity(categories.len());

        for (category, entries) in categories {
            let category_path = DocPath::category(&category)?;
            let mut records = Vec::with_capacity(entries.len());
            for mut entry in entries {
                let url = match entry.remove("url") {
                    Some(serde_json::Value::String(url)) if !url.trim().is_empty() => url,
                    _ => {
                        return Err(CatalogError::InvalidRecord(format!(
                            "tool in {category} has no url"
                        )));
                    }
                };
                entry.remove("votes");
                entry.remove("userVotes");

                let mut record = ToolRecord::new(url);
                record.extra = entry;
                records.push(record);
            }
            batches.push((category, category_path, records));
        }

        let mut summary = ImportSummary::default();
        for (category, category_path, records) in batches {
            self.store
                .write(&category_path, Document::new(), WriteMode::Merge, Precondition::None)
                .await?;
            summary.categories += 1;

            for record in records {
                let id = Uuid::new_v4().simple().to_string();
                let path = DocPath::tool(&category, &id)?;
                self.store
                    .write(
                        &path,
                        to_document(&record)?,
                        WriteMode::Replace,
                        Precondition::Version(0),
                    )
                    .await?;
                debug!("Added {} to {category}", record.url);
                summary.tools += 1;
            }
        }

        info!(
            "Imported {} tools across {} categories",
            summary.tools, summary.categories
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn tool(category: &str, id: &str, votes: i64) -> SavedTool {
        SavedTool {
            id: id.to_string(),
            url: format!("https://www.{id}.ai"),
            votes,
            category: category.to_string(),
        }
    }

    fn listings() -> Vec<CategoryListing> {
        vec![
            CategoryListing {
                category: "AI code generator".to_string(),
                tools: vec![tool("AI code generator", "coder", 3), tool("AI code generator", "pilot", 1)],
            },
            CategoryListing {
                category: "AI email writer".to_string(),
                tools: vec![tool("AI email writer", "mailer", 2)],
            },
        ]
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("https://www.jasper.ai/pricing"), "Jasper.ai");
        assert_eq!(display_name("https://copy.ai"), "Copy.ai");
        assert_eq!(display_name("not a url"), "not a url");
    }

    #[test]
    fn test_filter_by_search_drops_empty_categories() {
        let filtered = CatalogFilter::new().with_search("MAIL").apply(listings());
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].category, "AI email writer");
    }

    #[test]
    fn test_filter_by_category() {
        let filtered = CatalogFilter::new()
            .with_category("AI code generator")
            .apply(listings());
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].tools.len(), 2);
    }

    #[test]
    fn test_paginate_grows_with_page() {
        let first = paginate(&listings(), 1, 2);
        assert_eq!(first.listings.len(), 1);
        assert!(first.has_more);

        let second = paginate(&listings(), 2, 2);
        assert_eq!(second.listings.len(), 2);
        assert_eq!(second.listings[1].tools.len(), 1);
        assert!(!second.has_more);
    }

    #[tokio::test]
    async fn test_import_then_load_sorted() {
        let store = Arc::new(MemoryStore::new());
        let catalog = Catalog::new(store.clone());

        let summary = catalog
            .import(&json!({
                "AI music composer": [
                    {"url": "https://tune.ai", "name": "Tune"},
                    {"url": "https://beat.ai", "votes": 40}
                ],
                "AI data analyst": [{"url": "https://numbers.ai"}]
            }))
            .await
            .unwrap();
        assert_eq!(summary, ImportSummary { categories: 2, tools: 3 });

        let loaded = catalog.load().await.unwrap();
        let categories: Vec<_> = loaded.iter().map(|l| l.category.as_str()).collect();
        assert_eq!(categories, vec!["AI data analyst", "AI music composer"]);
        assert!(loaded[1].tools.iter().all(|t| t.votes == 0));

        let first = &loaded[1].tools[0];
        let record = catalog
            .tool(&ToolRef::new("AI music composer", first.id.clone()))
            .await
            .unwrap();
        assert_eq!(record.url, first.url);
    }

    #[tokio::test]
    async fn test_import_rejects_missing_url() {
        let catalog = Catalog::new(Arc::new(MemoryStore::new()));
        let result = catalog
            .import(&json!({"AI video editor": [{"name": "no url"}]}))
            .await;
        assert!(matches!(result, Err(CatalogError::InvalidRecord(_))));
    }

    #[tokio::test]
    async fn test_import_checks_every_entry_first() {
        let store = Arc::new(MemoryStore::new());
        let catalog = Catalog::new(store.clone());
        let result = catalog
            .import(&json!({
                "AI chatbot creator": [{"url": "https://chat.ai"}],
                "AI video editor": [{"url": "https://cut.ai"}, {"name": "no url"}]
            }))
            .await;

        assert!(matches!(result, Err(CatalogError::InvalidRecord(_))));
        assert!(store.is_empty().await);
        assert!(catalog.load().await.unwrap().is_empty());
    }
}
