use std::{fs, path::Path};

use anyhow::Context as _;
use chrono::Utc;
use fs_extra::dir::CopyOptions;
use log::{debug, info, warn};

use crate::context::Context;

mod blocks;
mod data;
mod highlight;
mod layout;
pub(crate) mod markdown;
mod nav;
pub(crate) mod search;
mod sitemap;
mod toc;
mod utils;

use data::Page;
use layout::{Layout, Slots};
use nav::NavNode;
use search::SearchIndexEntry;
use sitemap::Sitemap;

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct BuildReport {
    pub pages: usize,
    pub search_entries: Option<usize>,
    pub sitemap_written: bool,
}

fn prepare_out_dir(ctx: &Context) -> anyhow::Result<()> {
    fs_extra::dir::remove(&ctx.out_dir)?;
    fs_extra::dir::create_all(&ctx.out_dir, false)?;

    let mut cp_opts = CopyOptions::new();
    cp_opts.copy_inside = true;
    cp_opts.content_only = true;
    cp_opts.overwrite = true;
    for dir in ctx.static_dirs() {
        let Some(name) = dir.file_name() else {
            continue;
        };
        if !dir.is_dir() {
            debug!("{dir:?} does not exist. skipping...");
            continue;
        }
        let dest = ctx.out_dir.join(name);
        fs_extra::dir::create_all(&dest, false)?;
        fs_extra::dir::copy(&dir, &dest, &cp_opts)
            .with_context(|| format!("while copying {dir:?}"))?;
    }
    Ok(())
}

/// Every markdown page under `pages_dir`, in directory listing order.
fn collect_pages(pages_dir: &Path) -> anyhow::Result<Vec<Page>> {
    let mut pages = vec![];
    collect_pages_into(pages_dir, "", &mut pages)?;
    Ok(pages)
}

fn collect_pages_into(dir: &Path, base_path: &str, pages: &mut Vec<Page>) -> anyhow::Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("while reading {dir:?}"))? {
        let entry = entry?;
        let meta = entry.metadata()?;
        let name = entry.file_name().to_string_lossy().to_string();

        if meta.is_dir() {
            collect_pages_into(&entry.path(), &format!("{base_path}{name}/"), pages)?;
        } else if let Some(stem) = name.strip_suffix(".md").filter(|_| meta.is_file()) {
            pages.push(Page::load(&entry.path(), format!("{base_path}{stem}.html"))?);
        }
    }
    Ok(())
}

fn generate_page(ctx: &Context, layout: &Layout, nav: &[NavNode], page: &Page) -> anyhow::Result<()> {
    let toc = toc::generate(&page.body);
    let navigation = nav::render_navigation(nav, &page.path);
    let pagination = nav::render_pagination(nav, &page.path);
    let html = layout.render(&Slots {
        title: &page.title,
        description: &page.description,
        content: &page.body,
        navigation: &navigation,
        toc: &toc,
        pagination: &pagination,
    });

    let out_path = ctx.out_dir.join(&page.path);
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&out_path, html).with_context(|| format!("while writing {out_path:?}"))?;
    debug!("{:?} -> {:?}", page.source, out_path);
    Ok(())
}

/// Builds the whole site. Any I/O failure aborts the build.
pub(crate) fn generate(ctx: &Context) -> anyhow::Result<BuildReport> {
    let layout = Layout::load(&ctx.template_path)?;
    prepare_out_dir(ctx)?;

    let pages_dir = ctx.pages_dir();
    let nav = nav::build_navigation(&pages_dir)?;
    let pages = collect_pages(&pages_dir)?;
    let index: Vec<SearchIndexEntry> = pages.iter().map(SearchIndexEntry::from_page).collect();

    for page in pages.iter() {
        generate_page(ctx, &layout, &nav, page)
            .with_context(|| format!("while generating from {:?}", page.source))?;
    }

    let mut report = BuildReport {
        pages: pages.len(),
        ..Default::default()
    };

    if ctx.search_index {
        search::write_search_index(&ctx.out_dir, &index)?;
        report.search_entries = Some(index.len());
    }

    if ctx.sitemap {
        match &ctx.base_url {
            Some(base_url) => {
                Sitemap::from_pages(base_url, &pages, Utc::now()).write(&ctx.out_dir)?;
                report.sitemap_written = true;
            }
            None => warn!("No base url given (--base-url or BLOG_URL). skipping sitemap..."),
        }
    }

    info!("Built {} pages into {:?}", report.pages, ctx.out_dir);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    const LAYOUT: &str = "<html><head><title>{{ title }}</title>\
        <meta name=\"description\" content=\"{{ description }}\"></head>\
        <body><nav>{{ navigation }}</nav><aside>{{ toc }}</aside><main>{{ content }}</main><div class=\"pagination\">{{ pagination }}</div></body></html>";

    fn site(root: &Path) -> Context {
        let src = root.join("src");
        fs::create_dir_all(src.join("pages/guide")).unwrap();
        fs::create_dir_all(src.join("assets/css")).unwrap();
        fs::create_dir_all(root.join("templates")).unwrap();
        fs::write(root.join("templates/layout.html"), LAYOUT).unwrap();
        fs::write(src.join("assets/css/site.css"), "body {}").unwrap();
        fs::write(
            src.join("pages/index.md"),
            "---\ntitle: Home\ndescription: Start here\n---\n# Welcome\n\n## Why\n\ntext\n",
        )
        .unwrap();
        fs::write(
            src.join("pages/guide/intro.md"),
            "---\ntitle: Intro\ncategory: guide\n---\n# Intro\n\n:::warning Read this :::\n\n```rust\nfn main() {}\n```\n",
        )
        .unwrap();
        fs::write(src.join("pages/guide/notes.txt"), "not a page").unwrap();

        Context {
            source_dir: src,
            out_dir: root.join("dist"),
            template_path: root.join("templates/layout.html"),
            base_url: Some("https://example.com/".to_string()),
            search_index: true,
            sitemap: true,
        }
    }

    #[test]
    fn builds_site() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = site(dir.path());
        // stale output is removed
        fs::create_dir_all(&ctx.out_dir).unwrap();
        fs::write(ctx.out_dir.join("stale.html"), "old").unwrap();

        let report = generate(&ctx).unwrap();
        assert_eq!(
            report,
            BuildReport {
                pages: 2,
                search_entries: Some(2),
                sitemap_written: true,
            }
        );

        let out = &ctx.out_dir;
        assert!(!out.join("stale.html").exists());
        assert!(out.join("assets/css/site.css").exists());
        assert!(!out.join("guide/notes.html").exists());

        let index = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(index.contains("<title>Home</title>"));
        assert!(index.contains("content=\"Start here\""));
        assert!(index.contains("<a href=\"#why\">Why</a>"));
        assert!(index.contains("<li class=\"nav-item active\"><a class=\"nav-link\" href=\"/index.html\">Home</a></li>"));

        let intro = fs::read_to_string(out.join("guide/intro.html")).unwrap();
        assert!(intro.contains("custom-block warning"));
        assert!(intro.contains("<li class=\"nav-item active\"><a class=\"nav-link\" href=\"/guide/intro.html\">Intro</a></li>"));
        assert_eq!(intro.matches("active").count(), 1);
        assert!(intro.contains("<pre><code class=\"language-rust\">"));
        assert!(intro.contains("← Home</a>") || intro.contains(">Home →</a>"));

        let search = fs::read_to_string(out.join(search::SEARCH_INDEX_PATH)).unwrap();
        let search: serde_json::Value = serde_json::from_str(&search).unwrap();
        let entries = search.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries
            .iter()
            .any(|e| e["path"] == "guide/intro.html" && e["category"] == "guide"));

        let sitemap = fs::read_to_string(out.join("sitemap.xml")).unwrap();
        assert!(sitemap.contains("<loc>https://example.com/guide/intro.html</loc>"));
        assert!(sitemap.contains("<loc>https://example.com/index.html</loc>"));
    }

    #[test]
    fn optional_outputs_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context {
            base_url: None,
            search_index: false,
            ..site(dir.path())
        };

        let report = generate(&ctx).unwrap();
        assert_eq!(report.search_entries, None);
        assert!(!report.sitemap_written);
        assert!(!ctx.out_dir.join("sitemap.xml").exists());
        assert!(!ctx.out_dir.join(search::SEARCH_INDEX_PATH).exists());
    }

    #[test]
    fn missing_layout_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context {
            template_path: PathBuf::from("/nonexistent/layout.html"),
            ..site(dir.path())
        };
        assert!(generate(&ctx).is_err());
    }
}
