//! `sitemap.xml` for the generated pages.
//!
//! Every entry carries the build time as `lastmod`, so each build produces a
//! new sitemap even when no page changed.

use std::{fs, path::Path};

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use log::info;

use super::{data::Page, utils::escape_xml};

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

#[derive(Debug)]
pub(crate) struct Sitemap {
    urls: Vec<UrlEntry>,
}

#[derive(Debug, PartialEq, Eq)]
struct UrlEntry {
    loc: String,
    lastmod: String,
}

impl Sitemap {
    pub fn from_pages(base_url: &str, pages: &[Page], built_at: DateTime<Utc>) -> Self {
        let base_url = base_url.trim_end_matches('/');
        let lastmod = built_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        let urls = pages
            .iter()
            .map(|page| UrlEntry {
                loc: format!("{base_url}/{}", page.path),
                lastmod: lastmod.clone(),
            })
            .collect();
        Self { urls }
    }

    fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(4096);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
        xml.push('\n');
        for entry in &self.urls {
            xml.push_str("  <url>\n");
            xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
            xml.push_str(&format!("    <lastmod>{}</lastmod>\n", entry.lastmod));
            xml.push_str("  </url>\n");
        }
        xml.push_str("</urlset>\n");
        xml
    }

    pub fn write(&self, out_dir: &Path) -> anyhow::Result<()> {
        let path = out_dir.join("sitemap.xml");
        fs::write(&path, self.to_xml()).with_context(|| format!("while writing {path:?}"))?;
        info!("Sitemap: {} urls", self.urls.len());
        Ok(())
    }
}
