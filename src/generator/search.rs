use std::{fs, path::Path};

use anyhow::Context;
use log::info;
use maud::html;
use serde::{Deserialize, Serialize};

use super::{data::Page, utils::strip_tags};

const CONTENT_LIMIT: usize = 500;
const DEFAULT_CATEGORY: &str = "general";
const MIN_QUERY_LENGTH: usize = 2;

/// Where the index lands, relative to the output directory.
pub(crate) const SEARCH_INDEX_PATH: &str = "assets/js/search-index.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct SearchIndexEntry {
    pub title: String,
    pub path: String,
    pub content: String,
    pub category: String,
}

impl SearchIndexEntry {
    pub fn from_page(page: &Page) -> Self {
        Self {
            title: page.title.clone(),
            path: page.path.clone(),
            content: plain_text(&page.body, CONTENT_LIMIT),
            category: page
                .frontmatter
                .non_empty("category")
                .unwrap_or(DEFAULT_CATEGORY)
                .to_string(),
        }
    }
}

/// Text of `html` without markup, whitespace collapsed, at most `limit`
/// characters.
pub(crate) fn plain_text(html: &str, limit: usize) -> String {
    let text = strip_tags(html);
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(limit).collect()
}

pub(crate) fn write_search_index(out_dir: &Path, entries: &[SearchIndexEntry]) -> anyhow::Result<()> {
    let path = out_dir.join(SEARCH_INDEX_PATH);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(entries)?;
    fs::write(&path, json).with_context(|| format!("while writing {path:?}"))?;
    info!("Search index: {} entries", entries.len());
    Ok(())
}

pub(crate) fn load_search_index(out_dir: &Path) -> anyhow::Result<Vec<SearchIndexEntry>> {
    let path = out_dir.join(SEARCH_INDEX_PATH);
    let raw = fs::read_to_string(&path).with_context(|| format!("while reading {path:?}"))?;
    serde_json::from_str(&raw).with_context(|| format!("while parsing {path:?}"))
}

/// Entries whose title or content contains `query`, ignoring case. Queries
/// shorter than two characters return `None`.
pub(crate) fn query<'a>(entries: &'a [SearchIndexEntry], term: &str) -> Option<Vec<&'a SearchIndexEntry>> {
    let term = term.to_lowercase();
    if term.chars().count() < MIN_QUERY_LENGTH {
        return None;
    }
    Some(
        entries
            .iter()
            .filter(|e| e.title.to_lowercase().contains(&term) || e.content.to_lowercase().contains(&term))
            .collect(),
    )
}

/// Result list for the search box; empty for too short queries.
pub(crate) fn render_results(entries: &[SearchIndexEntry], term: &str) -> String {
    let Some(results) = query(entries, term) else {
        return String::new();
    };
    if results.is_empty() {
        return html! { div.no-results { "Tidak ada hasil" } }.into_string();
    }
    html! {
        @for entry in results {
            div.search-result {
                a href={ "/" (entry.path) } { (entry.title) }
            }
        }
    }
    .into_string()
}
