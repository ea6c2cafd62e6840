use std::{
    fs::{File, OpenOptions},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context};
use log::{info, warn};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

pub(crate) const DRAFT_POSTS: &str = "draftPosts";
pub(crate) const ADMIN_ACTIVITY: &str = "adminActivity";
pub(crate) const EDITING_POST: &str = "editingPost";
pub(crate) const PRIMARY_COLOR: &str = "primaryColor";
pub(crate) const SECONDARY_COLOR: &str = "secondaryColor";
pub(crate) const BANNER_IMAGE: &str = "bannerImage";
pub(crate) const BLOG_TITLE: &str = "blogTitle";

pub(crate) fn views_key(file: &str) -> String {
    format!("views_{file}")
}

pub(crate) fn comments_key(file: &str) -> String {
    format!("comments_{file}")
}

pub(crate) fn reactions_key(file: &str) -> String {
    format!("reactions_{file}")
}

pub(crate) fn user_reaction_key(file: &str) -> String {
    format!("user_reaction_{file}")
}

/// String-keyed state owned by a single reader: view counters, comments,
/// reactions, drafts and admin settings.
pub(crate) trait ClientStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
}

#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    entries: std::collections::HashMap<String, String>,
}

#[cfg(test)]
impl ClientStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Store persisted as one flat JSON object. Changes stay in memory until
/// [`JsonFileStore::save`].
#[derive(Debug)]
pub(crate) struct JsonFileStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl JsonFileStore {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let entries = if path.exists() {
            let fd = File::open(path)?;
            let reader = BufReader::new(fd);
            serde_json::from_reader(reader)
                .map_err(|e| anyhow!(e))
                .with_context(|| format!("while reading state file {path:?}"))?
        } else {
            info!("State file({path:?}) does not exist. starting empty...");
            Map::new()
        };
        Ok(Self {
            path: path.to_owned(),
            entries,
        })
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let fd = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .with_context(|| format!("while writing state file {:?}", self.path))?;
        let mut writer = BufWriter::new(fd);
        serde_json::to_writer_pretty(&mut writer, &self.entries)?;
        writer
            .flush()
            .with_context(|| format!("while writing state file {:?}", self.path))
    }
}

impl ClientStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.entries.get(key)? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), Value::String(value));
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Reads a JSON encoded value, treating a missing or unreadable entry as the
/// default.
pub(crate) fn read_json<T, S>(store: &S, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: ClientStore + ?Sized,
{
    let Some(raw) = store.get(key) else {
        return T::default();
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!("Ignoring unreadable value of {key}: {e}");
        T::default()
    })
}

pub(crate) fn write_json<T, S>(store: &mut S, key: &str, value: &T) -> anyhow::Result<()>
where
    T: Serialize + ?Sized,
    S: ClientStore + ?Sized,
{
    store.set(key, serde_json::to_string(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_get_set_remove() {
        let mut store = MemoryStore::default();
        assert_eq!(store.get("theme"), None);
        store.set("theme", "dark".to_string());
        assert_eq!(store.get("theme").as_deref(), Some("dark"));
        store.remove("theme");
        assert_eq!(store.get("theme"), None);
    }

    #[test]
    fn json_helpers_fall_back_on_garbage() {
        let mut store = MemoryStore::default();
        store.set("comments_a.md", "{not json".to_string());
        let v: Vec<String> = read_json(&store, "comments_a.md");
        assert!(v.is_empty());

        write_json(&mut store, "list", &vec!["x", "y"]).unwrap();
        let v: Vec<String> = read_json(&store, "list");
        assert_eq!(v, vec!["x", "y"]);
    }

    #[test]
    fn file_store_persists_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = JsonFileStore::load(&path).unwrap();
        store.set(&views_key("a.md"), "3".to_string());
        store.set(BLOG_TITLE, "Notes".to_string());
        store.save().unwrap();

        let mut store = JsonFileStore::load(&path).unwrap();
        assert_eq!(store.get("views_a.md").as_deref(), Some("3"));
        store.remove(BLOG_TITLE);
        store.save().unwrap();

        let store = JsonFileStore::load(&path).unwrap();
        assert_eq!(store.get(BLOG_TITLE), None);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_flush_is_reported() {
        let mut store = JsonFileStore {
            path: PathBuf::from("/dev/full"),
            entries: Map::new(),
        };
        store.set(&views_key("a.md"), "1".to_string());
        assert!(store.save().is_err());
    }

    #[test]
    fn key_names() {
        assert_eq!(views_key("x.md"), "views_x.md");
        assert_eq!(comments_key("x.md"), "comments_x.md");
        assert_eq!(reactions_key("x.md"), "reactions_x.md");
        assert_eq!(user_reaction_key("x.md"), "user_reaction_x.md");
    }
}
