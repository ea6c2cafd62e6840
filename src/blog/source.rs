use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::metadata::Post;

pub(crate) const MANIFEST_FILE: &str = "posts.json";

/// One line of `posts.json`. Other fields in the manifest are ignored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct ManifestEntry {
    pub file: String,
}

/// Where posts come from.
pub(crate) trait PostSource {
    fn manifest(&self) -> anyhow::Result<Vec<ManifestEntry>>;
    fn fetch(&self, file: &str) -> anyhow::Result<String>;
}

/// Posts stored as `<dir>/posts.json` plus one markdown file per post.
#[derive(Debug, Clone)]
pub(crate) struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_owned(),
        }
    }
}

impl PostSource for DirSource {
    fn manifest(&self) -> anyhow::Result<Vec<ManifestEntry>> {
        let path = self.dir.join(MANIFEST_FILE);
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to fetch posts list {path:?}"))?;
        serde_json::from_str(&raw).with_context(|| format!("Invalid posts list {path:?}"))
    }

    fn fetch(&self, file: &str) -> anyhow::Result<String> {
        let path = self.dir.join(file);
        std::fs::read_to_string(&path).with_context(|| format!("Failed to fetch post {path:?}"))
    }
}

pub(crate) fn load_post<S: PostSource + ?Sized>(source: &S, file: &str) -> anyhow::Result<Post> {
    let markdown = source.fetch(file)?;
    Ok(Post::parse(&markdown, file))
}

/// Loads every post of the manifest one after another. A post that cannot be
/// loaded is logged and left out.
pub(crate) fn load_posts<S: PostSource + ?Sized>(source: &S) -> anyhow::Result<Vec<Post>> {
    let manifest = source.manifest()?;
    Ok(load_entries(source, &manifest))
}

fn load_entries<S: PostSource + ?Sized>(source: &S, manifest: &[ManifestEntry]) -> Vec<Post> {
    let mut posts = Vec::with_capacity(manifest.len());
    for entry in manifest {
        match load_post(source, &entry.file) {
            Ok(post) => {
                debug!("Loaded {}", entry.file);
                posts.push(post);
            }
            Err(e) => error!("Error loading post {}: {e:#}", entry.file),
        }
    }
    posts
}
