use std::path::Path;

use anyhow::Context;

/// The single HTML template every page is poured into.
#[derive(Debug, Clone)]
pub(crate) struct Layout {
    template: String,
}

#[derive(Debug, Default)]
pub(crate) struct Slots<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub content: &'a str,
    pub navigation: &'a str,
    pub toc: &'a str,
    pub pagination: &'a str,
}

impl Layout {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let template =
            std::fs::read_to_string(path).with_context(|| format!("while reading layout {path:?}"))?;
        Ok(Self::new(template))
    }

    pub fn new(template: String) -> Self {
        Self { template }
    }

    /// Replaces the first occurrence of each placeholder, in a fixed order.
    pub fn render(&self, slots: &Slots) -> String {
        self.template
            .replacen("{{ title }}", slots.title, 1)
            .replacen("{{ description }}", slots.description, 1)
            .replacen("{{ content }}", slots.content, 1)
            .replacen("{{ navigation }}", slots.navigation, 1)
            .replacen("{{ toc }}", slots.toc, 1)
            .replacen("{{ pagination }}", slots.pagination, 1)
    }
}
