use std::{path::Path, sync::OnceLock};

use chrono::{NaiveDate, Utc};
use regex::Regex;
use serde::Serialize;

use crate::frontmatter::{self, Frontmatter};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Serialize, Debug, Clone)]
pub(crate) struct Post {
    pub title: String,
    pub date: String,
    pub tags: Vec<String>,
    pub content: String,
    pub file: String,
    pub excerpt: String,

    #[serde(skip_serializing)]
    pub frontmatter: Frontmatter,
}

impl Post {
    pub fn parse(markdown: &str, file: &str) -> Self {
        Self::parse_on(markdown, file, Utc::now().date_naive())
    }

    /// Parses a post, using `today` wherever a date has to be made up.
    pub fn parse_on(markdown: &str, file: &str, today: NaiveDate) -> Self {
        let Some((frontmatter, body)) = frontmatter::split(markdown) else {
            let date = date_from_filename(file).unwrap_or(today);
            return Self {
                title: title_from_filename(file),
                date: date.format(DATE_FORMAT).to_string(),
                tags: vec![],
                content: markdown.to_string(),
                file: file.to_string(),
                excerpt: frontmatter::excerpt(markdown),
                frontmatter: Frontmatter::default(),
            };
        };

        Self {
            title: frontmatter
                .non_empty("title")
                .map_or_else(|| title_from_filename(file), str::to_string),
            date: frontmatter
                .non_empty("date")
                .map_or_else(|| today.format(DATE_FORMAT).to_string(), str::to_string),
            tags: frontmatter.tags(),
            content: body.to_string(),
            file: file.to_string(),
            excerpt: frontmatter::excerpt(body),
            frontmatter,
        }
    }

    /// The post date, if it starts with a `YYYY-MM-DD` date.
    pub fn date_value(&self) -> Option<NaiveDate> {
        parse_date_prefix(&self.date)
    }

    /// Source of the first markdown image in the body.
    pub fn first_image(&self) -> Option<&str> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN.get_or_init(|| Regex::new(r"!\[.*?\]\((.*?)\)").unwrap());
        pattern
            .captures(&self.content)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    pub fn to_markdown(&self) -> String {
        frontmatter::to_markdown(&self.title, &self.date, &self.tags, &self.content)
    }
}

/// `2024-01-02-my_post.md` -> `2024 01 02 my post`
pub(crate) fn title_from_filename(file: &str) -> String {
    let stem = Path::new(file)
        .file_stem()
        .map_or_else(|| file.to_string(), |s| s.to_string_lossy().into_owned());
    stem.replace(['-', '_'], " ")
}

fn date_from_filename(file: &str) -> Option<NaiveDate> {
    parse_date_prefix(file)
}

fn parse_date_prefix(s: &str) -> Option<NaiveDate> {
    let prefix: String = s.chars().take(10).collect();
    NaiveDate::parse_from_str(&prefix, DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    #[test]
    fn parses_frontmatter_post() {
        let md = "---\ntitle: \"First post\"\ndate: \"2024-01-15\"\ntags: \"rust, blog\"\n---\n\nHello *world*";
        let post = Post::parse_on(md, "first.md", today());
        assert_eq!(post.title, "First post");
        assert_eq!(post.date, "2024-01-15");
        assert_eq!(post.tags, vec!["rust", "blog"]);
        assert_eq!(post.content, "Hello *world*");
        assert_eq!(post.excerpt, "Hello world");
        assert_eq!(post.file, "first.md");
        assert_eq!(post.date_value(), NaiveDate::from_ymd_opt(2024, 1, 15));
    }

    #[test]
    fn missing_fields_fall_back() {
        let md = "---\nauthor: someone\n---\nbody";
        let post = Post::parse_on(md, "my-great_post.md", today());
        assert_eq!(post.title, "my great post");
        assert_eq!(post.date, "2025-06-30");
        assert!(post.tags.is_empty());
        assert_eq!(post.frontmatter.get("author"), Some("someone"));
    }

    #[test]
    fn no_frontmatter_uses_filename() {
        let md = "# Untitled\n\nJust text.";
        let post = Post::parse_on(md, "2023-12-24-holiday_notes.md", today());
        assert_eq!(post.title, "2023 12 24 holiday notes");
        assert_eq!(post.date, "2023-12-24");
        assert!(post.tags.is_empty());
        assert_eq!(post.content, md);
    }

    #[test]
    fn no_frontmatter_and_undated_filename_uses_today() {
        let post = Post::parse_on("text", "notes.md", today());
        assert_eq!(post.title, "notes");
        assert_eq!(post.date, "2025-06-30");
    }

    #[test]
    fn fallback_is_deterministic() {
        let a = Post::parse_on("body", "a-b_c.md", today());
        let b = Post::parse_on("other body", "a-b_c.md", today());
        assert_eq!(a.title, b.title);
        assert_eq!(a.tags, b.tags);
    }

    #[test]
    fn finds_first_image() {
        let md = "---\ntitle: t\n---\ntext ![one](img/1.png) and ![two](img/2.png)";
        let post = Post::parse_on(md, "t.md", today());
        assert_eq!(post.first_image(), Some("img/1.png"));
    }

    #[test]
    fn serializes_back_to_markdown() {
        let md = "---\ntitle: \"T\"\ndate: \"2024-02-02\"\ntags: \"a, b\"\n---\n\nbody";
        let post = Post::parse_on(md, "t.md", today());
        assert_eq!(post.to_markdown(), md);
    }
}
