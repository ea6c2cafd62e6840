use std::{collections::BTreeMap, sync::OnceLock};

use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use log::info;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{
    engagement, render,
    source::{ManifestEntry, PostSource, MANIFEST_FILE},
};
use crate::{
    frontmatter,
    metadata::Post,
    store::{self, ClientStore},
};

const ACTIVITY_LIMIT: usize = 20;
pub(crate) const RECENT_ACTIVITY_LIMIT: usize = 5;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct Activity {
    pub description: String,
    pub date: String,
}

/// Appends to the activity log, keeping only the newest entries.
pub(crate) fn add_activity<S: ClientStore + ?Sized>(
    store: &mut S,
    description: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let mut activities: Vec<Activity> = store::read_json(&*store, store::ADMIN_ACTIVITY);
    activities.push(Activity {
        description: description.to_string(),
        date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
    });
    if activities.len() > ACTIVITY_LIMIT {
        activities.drain(..activities.len() - ACTIVITY_LIMIT);
    }
    store::write_json(store, store::ADMIN_ACTIVITY, &activities)?;
    info!("activity: {description}");
    Ok(())
}

pub(crate) fn recent_activity<S: ClientStore + ?Sized>(store: &S, limit: usize) -> Vec<Activity> {
    let mut activities: Vec<Activity> = store::read_json(store, store::ADMIN_ACTIVITY);
    activities.sort_by_key(|a| std::cmp::Reverse(DateTime::parse_from_rfc3339(&a.date).ok()));
    activities.truncate(limit);
    activities
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DashboardStats {
    pub total_posts: usize,
    pub total_views: u64,
    pub total_comments: usize,
}

pub(crate) fn dashboard_stats<S: ClientStore + ?Sized>(
    store: &S,
    manifest: &[ManifestEntry],
) -> DashboardStats {
    DashboardStats {
        total_posts: manifest.len(),
        total_views: manifest
            .iter()
            .map(|e| engagement::views(store, &e.file))
            .sum(),
        total_comments: manifest
            .iter()
            .map(|e| engagement::comments(store, &e.file).len())
            .sum(),
    }
}

/// A post being written in the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Draft {
    pub title: String,
    pub date: String,
    pub tags: Vec<String>,
    pub content: String,
}

impl Draft {
    pub fn new(title: &str, date: &str, tags: &str, content: &str) -> Self {
        Self {
            title: title.trim().to_string(),
            date: date.trim().to_string(),
            tags: parse_tags(tags),
            content: content.trim().to_string(),
        }
    }

    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            date: post.date.clone(),
            tags: post.tags.clone(),
            content: post.content.clone(),
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.title.is_empty() || self.date.is_empty() || self.content.is_empty() {
            bail!("Please fill in all required fields.");
        }
        Ok(())
    }

    /// `My First Post!` -> `my-first-post.md`
    pub fn filename(&self) -> String {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN.get_or_init(|| Regex::new(r"[^a-z0-9]+").unwrap());
        let lower = self.title.to_lowercase();
        let slug = pattern.replace_all(&lower, "-");
        let slug = slug.strip_prefix('-').unwrap_or(&*slug);
        let slug = slug.strip_suffix('-').unwrap_or(slug);
        format!("{slug}.md")
    }

    pub fn to_markdown(&self) -> String {
        frontmatter::to_markdown(&self.title, &self.date, &self.tags, &self.content)
    }
}

fn parse_tags(input: &str) -> Vec<String> {
    let input = input.trim();
    if input.is_empty() {
        return vec![];
    }
    input.split(',').map(|t| t.trim().to_string()).collect()
}

/// Stores the draft under its filename and returns that filename.
pub(crate) fn save_draft<S: ClientStore + ?Sized>(
    store: &mut S,
    draft: &Draft,
    now: DateTime<Utc>,
) -> anyhow::Result<String> {
    draft.validate()?;
    let filename = draft.filename();
    let mut drafts = drafts(&*store);
    drafts.insert(filename.clone(), draft.to_markdown());
    store::write_json(store, store::DRAFT_POSTS, &drafts)?;
    add_activity(store, &format!("Created new post: {}", draft.title), now)?;
    Ok(filename)
}

/// Markdown of a draft, ready to be written to disk.
pub(crate) fn export_draft(draft: &Draft) -> anyhow::Result<(String, String)> {
    draft.validate()?;
    Ok((draft.filename(), draft.to_markdown()))
}

/// The draft as it would look once published.
pub(crate) fn preview_draft(draft: &Draft) -> anyhow::Result<String> {
    draft.validate()?;
    let post = Post::parse(&draft.to_markdown(), &draft.filename());
    Ok(render::post_preview(&post))
}

/// Starting points for a new post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PostTemplate {
    Standard,
    Tutorial,
    Review,
    Listicle,
}

impl PostTemplate {
    pub const NAMES: [&'static str; 4] = ["standard", "tutorial", "review", "listicle"];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "standard" => Some(Self::Standard),
            "tutorial" => Some(Self::Tutorial),
            "review" => Some(Self::Review),
            "listicle" => Some(Self::Listicle),
            _ => None,
        }
    }

    fn source(self) -> &'static str {
        match self {
            Self::Standard => include_str!("templates/standard.md"),
            Self::Tutorial => include_str!("templates/tutorial.md"),
            Self::Review => include_str!("templates/review.md"),
            Self::Listicle => include_str!("templates/listicle.md"),
        }
    }

    /// Template markdown dated `today`.
    pub fn render(self, today: NaiveDate) -> String {
        self.source()
            .replace("{{ date }}", &today.format("%Y-%m-%d").to_string())
    }
}

/// Raw markdown of a published post.
pub(crate) fn export_post<S, P>(store: &mut S, source: &P, file: &str, now: DateTime<Utc>) -> anyhow::Result<String>
where
    S: ClientStore + ?Sized,
    P: PostSource + ?Sized,
{
    let markdown = source.fetch(file)?;
    add_activity(store, &format!("Downloaded post: {file}"), now)?;
    Ok(markdown)
}

/// The manifest, pretty printed. Fields other than `file` are kept.
pub(crate) fn export_manifest<S, P>(store: &mut S, source: &P, now: DateTime<Utc>) -> anyhow::Result<String>
where
    S: ClientStore + ?Sized,
    P: PostSource + ?Sized,
{
    let raw = source.fetch(MANIFEST_FILE)?;
    let manifest: serde_json::Value =
        serde_json::from_str(&raw).context("Failed to download posts.json")?;
    let json = serde_json::to_string_pretty(&manifest)?;
    add_activity(store, "Downloaded posts.json", now)?;
    Ok(json)
}

pub(crate) fn drafts<S: ClientStore + ?Sized>(store: &S) -> BTreeMap<String, String> {
    store::read_json(store, store::DRAFT_POSTS)
}

/// Opens a published post in the editor.
pub(crate) fn begin_edit<S: ClientStore + ?Sized>(
    store: &mut S,
    post: &Post,
    now: DateTime<Utc>,
) -> anyhow::Result<Draft> {
    store.set(store::EDITING_POST, post.file.clone());
    add_activity(store, &format!("Edited post: {}", post.title), now)?;
    Ok(Draft::from_post(post))
}

pub(crate) fn editing_post<S: ClientStore + ?Sized>(store: &S) -> Option<String> {
    store.get(store::EDITING_POST)
}

/// Posts are published files; deleting one is up to the operator. This only
/// records the request and returns what has to be done by hand.
pub(crate) fn delete_post<S: ClientStore + ?Sized>(
    store: &mut S,
    file: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<String> {
    add_activity(store, &format!("Deleted post: {file}"), now)?;
    Ok(format!(
        "Post \"{file}\" has been marked for deletion. Please update posts.json and remove the file from the server."
    ))
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct Settings {
    pub primary_color: String,
    pub secondary_color: String,
    pub banner_image: String,
    pub blog_title: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            primary_color: "#3498db".to_string(),
            secondary_color: "#2c3e50".to_string(),
            banner_image: String::new(),
            blog_title: "Static Blog".to_string(),
        }
    }
}

impl Settings {
    pub fn load<S: ClientStore + ?Sized>(store: &S) -> Self {
        let defaults = Self::default();
        // an empty stored value counts as unset
        let get = |key: &str, default: String| {
            store.get(key).filter(|v| !v.is_empty()).unwrap_or(default)
        };
        Self {
            primary_color: get(store::PRIMARY_COLOR, defaults.primary_color),
            secondary_color: get(store::SECONDARY_COLOR, defaults.secondary_color),
            banner_image: get(store::BANNER_IMAGE, defaults.banner_image),
            blog_title: get(store::BLOG_TITLE, defaults.blog_title),
        }
    }

    pub fn save<S: ClientStore + ?Sized>(&self, store: &mut S, now: DateTime<Utc>) -> anyhow::Result<()> {
        store.set(store::PRIMARY_COLOR, self.primary_color.clone());
        store.set(store::SECONDARY_COLOR, self.secondary_color.clone());
        match self.banner_image.trim() {
            "" => store.remove(store::BANNER_IMAGE),
            banner => store.set(store::BANNER_IMAGE, banner.to_string()),
        }
        store.set(store::BLOG_TITLE, self.blog_title.trim().to_string());
        add_activity(store, "Updated blog settings", now)
    }
}

/// Admin post list filter: title or any tag contains `term`.
pub(crate) fn filter_posts<'a>(posts: &'a [Post], term: &str) -> Vec<&'a Post> {
    let term = term.to_lowercase();
    posts
        .iter()
        .filter(|post| {
            term.is_empty()
                || post.title.to_lowercase().contains(&term)
                || post.tags.iter().any(|t| t.to_lowercase().contains(&term))
        })
        .collect()
}
