use std::{fs, path::Path};

use anyhow::Context;
use log::debug;
use maud::{html, PreEscaped};

use crate::frontmatter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NavNode {
    pub title: String,
    pub path: String,
    /// `None` for pages, `Some` for folders.
    pub children: Option<Vec<NavNode>>,
}

/// Mirrors `pages_dir` into a navigation tree, in directory listing order.
pub(crate) fn build_navigation(pages_dir: &Path) -> anyhow::Result<Vec<NavNode>> {
    walk(pages_dir, "")
}

fn walk(dir: &Path, base_path: &str) -> anyhow::Result<Vec<NavNode>> {
    let mut nav = vec![];
    for entry in fs::read_dir(dir).with_context(|| format!("while reading {dir:?}"))? {
        let entry = entry?;
        let meta = entry.metadata()?;
        let name = entry.file_name().to_string_lossy().to_string();

        if meta.is_dir() {
            let path = format!("{base_path}{name}/");
            let children = walk(&entry.path(), &path)?;
            nav.push(NavNode {
                title: name,
                path,
                children: Some(children),
            });
        } else if let Some(stem) = name.strip_suffix(".md").filter(|_| meta.is_file()) {
            let content = fs::read_to_string(entry.path())
                .with_context(|| format!("while reading {:?}", entry.path()))?;
            let title = frontmatter::split(&content)
                .and_then(|(fm, _)| fm.non_empty("title").map(str::to_string))
                .unwrap_or_else(|| stem.to_string());
            nav.push(NavNode {
                title,
                path: format!("{base_path}{stem}.html"),
                children: None,
            });
        } else {
            debug!("Skipping {:?} in navigation", entry.path());
        }
    }
    Ok(nav)
}

/// Renders the tree as nested lists. The page at `current_path` is marked
/// `active`; folders are labels only.
pub(crate) fn render_navigation(nav: &[NavNode], current_path: &str) -> String {
    html! {
        ul.nav-list {
            @for item in nav {
                @if let Some(children) = &item.children {
                    li.nav-item.nav-folder {
                        div.nav-title { (item.title) }
                        div.nav-children {
                            (PreEscaped(render_navigation(children, current_path)))
                        }
                    }
                } @else {
                    li.nav-item.active[item.path == current_path] {
                        a.nav-link href={ "/" (item.path) } { (item.title) }
                    }
                }
            }
        }
    }
    .into_string()
}

/// Pages of the tree in the order they appear in the rendered navigation.
fn pages(nav: &[NavNode]) -> Vec<&NavNode> {
    let mut out = vec![];
    for item in nav {
        match &item.children {
            Some(children) => out.extend(pages(children)),
            None => out.push(item),
        }
    }
    out
}

/// Links to the pages before and after `current_path` in navigation order.
/// Empty when the page is not in the navigation.
pub(crate) fn render_pagination(nav: &[NavNode], current_path: &str) -> String {
    let pages = pages(nav);
    let Some(index) = pages.iter().position(|p| p.path == current_path) else {
        return String::new();
    };
    let prev = index.checked_sub(1).and_then(|i| pages.get(i));
    let next = pages.get(index + 1);
    html! {
        @if let Some(prev) = prev {
            a href={ "/" (prev.path) } { "← " (prev.title) }
        } @else {
            span {}
        }
        @if let Some(next) = next {
            a href={ "/" (next.path) } { (next.title) " →" }
        } @else {
            span {}
        }
    }
    .into_string()
}
