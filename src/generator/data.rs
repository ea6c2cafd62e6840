use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::frontmatter::{self, Frontmatter};

use super::{blocks, markdown};

/// A source page, rendered up to (but not including) the layout.
#[derive(Debug, Clone)]
pub(crate) struct Page {
    pub source: PathBuf,
    /// Output path relative to the output directory, `/` separated.
    pub path: String,
    pub title: String,
    pub description: String,
    pub frontmatter: Frontmatter,
    pub body: String,
}

impl Page {
    pub fn load(source: &Path, path: String) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(source)
            .with_context(|| format!("while reading {source:?}"))?;
        Ok(Self::from_markdown(source, path, &content))
    }

    pub fn from_markdown(source: &Path, path: String, content: &str) -> Self {
        let (frontmatter, body) =
            frontmatter::split(content).unwrap_or((Frontmatter::default(), content));

        let title = frontmatter.non_empty("title").map_or_else(
            || {
                source
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default()
            },
            str::to_string,
        );
        let description = frontmatter.get("description").unwrap_or("").to_string();
        let body = blocks::transform(&markdown::render(body));

        Self {
            source: source.to_owned(),
            path,
            title,
            description,
            frontmatter,
            body,
        }
    }
}
