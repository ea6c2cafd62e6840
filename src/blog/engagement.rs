use std::collections::BTreeMap;

use anyhow::bail;
use chrono::{DateTime, SecondsFormat, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::store::{self, ClientStore};

pub(crate) const DEFAULT_REACTIONS: [&str; 4] = ["heart", "like", "laugh", "wow"];

pub(crate) fn views<S: ClientStore + ?Sized>(store: &S, file: &str) -> u64 {
    store
        .get(&store::views_key(file))
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

pub(crate) fn record_view<S: ClientStore + ?Sized>(store: &mut S, file: &str) -> u64 {
    let views = views(&*store, file) + 1;
    store.set(&store::views_key(file), views.to_string());
    views
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct Comment {
    pub name: String,
    pub text: String,
    pub date: String,
}

pub(crate) fn comments<S: ClientStore + ?Sized>(store: &S, file: &str) -> Vec<Comment> {
    store::read_json(store, &store::comments_key(file))
}

pub(crate) fn add_comment<S: ClientStore + ?Sized>(
    store: &mut S,
    file: &str,
    name: &str,
    text: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<Comment>> {
    let (name, text) = (name.trim(), text.trim());
    if name.is_empty() || text.is_empty() {
        bail!("Please enter both name and comment.");
    }

    let key = store::comments_key(file);
    let mut comments: Vec<Comment> = store::read_json(&*store, &key);
    comments.push(Comment {
        name: name.to_string(),
        text: text.to_string(),
        date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
    });
    store::write_json(store, &key, &comments)?;
    info!("{name} commented on {file}");
    Ok(comments)
}

/// Reaction counts of a post plus the reader's own reaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Reactions {
    /// Default reactions first, then any other stored reaction.
    pub counts: Vec<(String, i64)>,
    pub mine: Option<String>,
}

#[cfg(test)]
impl Reactions {
    pub fn count(&self, reaction: &str) -> i64 {
        self.counts
            .iter()
            .find(|(r, _)| r == reaction)
            .map_or(0, |(_, c)| *c)
    }
}

pub(crate) fn reactions<S: ClientStore + ?Sized>(store: &S, file: &str) -> Reactions {
    let stored: BTreeMap<String, i64> = store::read_json(store, &store::reactions_key(file));
    let mut counts: Vec<(String, i64)> = DEFAULT_REACTIONS
        .iter()
        .map(|r| (r.to_string(), stored.get(*r).copied().unwrap_or(0)))
        .collect();
    counts.extend(
        stored
            .into_iter()
            .filter(|(r, _)| !DEFAULT_REACTIONS.contains(&r.as_str())),
    );
    Reactions {
        counts,
        mine: store.get(&store::user_reaction_key(file)),
    }
}

/// Records `reaction` as the reader's reaction. Switching from another
/// reaction takes the old one back; reacting again with the same reaction
/// still counts.
pub(crate) fn react<S: ClientStore + ?Sized>(
    store: &mut S,
    file: &str,
    reaction: &str,
) -> anyhow::Result<Reactions> {
    let key = store::reactions_key(file);
    let user_key = store::user_reaction_key(file);
    let mut stored: BTreeMap<String, i64> = store::read_json(&*store, &key);

    if let Some(previous) = store.get(&user_key).filter(|p| p.as_str() != reaction) {
        *stored.entry(previous).or_insert(0) -= 1;
    }
    *stored.entry(reaction.to_string()).or_insert(0) += 1;

    store::write_json(store, &key, &stored)?;
    store.set(&user_key, reaction.to_string());
    Ok(reactions(&*store, file))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::store::MemoryStore;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn counts_views() {
        let mut store = MemoryStore::default();
        assert_eq!(views(&store, "a.md"), 0);
        assert_eq!(record_view(&mut store, "a.md"), 1);
        assert_eq!(record_view(&mut store, "a.md"), 2);
        assert_eq!(views(&store, "a.md"), 2);
        assert_eq!(views(&store, "b.md"), 0);
    }

    #[test]
    fn garbage_view_count_reads_as_zero() {
        let mut store = MemoryStore::default();
        store.set("views_a.md", "lots".to_string());
        assert_eq!(views(&store, "a.md"), 0);
        assert_eq!(record_view(&mut store, "a.md"), 1);
    }

    #[test]
    fn adds_comments() {
        let mut store = MemoryStore::default();
        assert!(comments(&store, "a.md").is_empty());

        add_comment(&mut store, "a.md", " Ann ", " Nice post ", now()).unwrap();
        let all = add_comment(&mut store, "a.md", "Bob", "Agreed", now()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(
            comments(&store, "a.md")[0],
            Comment {
                name: "Ann".to_string(),
                text: "Nice post".to_string(),
                date: "2024-04-01T12:00:00.000Z".to_string(),
            }
        );
    }

    #[test]
    fn comment_needs_name_and_text() {
        let mut store = MemoryStore::default();
        assert!(add_comment(&mut store, "a.md", "", "text", now()).is_err());
        assert!(add_comment(&mut store, "a.md", "Ann", "   ", now()).is_err());
        assert!(comments(&store, "a.md").is_empty());
    }

    #[test]
    fn reactions_default_to_zero() {
        let store = MemoryStore::default();
        let r = reactions(&store, "a.md");
        assert_eq!(r.counts.len(), 4);
        assert!(r.counts.iter().all(|(_, c)| *c == 0));
        assert_eq!(r.mine, None);
    }

    #[test]
    fn switching_reaction_moves_the_count() {
        let mut store = MemoryStore::default();
        let r = react(&mut store, "a.md", "heart").unwrap();
        assert_eq!(r.count("heart"), 1);
        assert_eq!(r.mine.as_deref(), Some("heart"));

        let r = react(&mut store, "a.md", "wow").unwrap();
        assert_eq!(r.count("heart"), 0);
        assert_eq!(r.count("wow"), 1);
        assert_eq!(r.mine.as_deref(), Some("wow"));
    }

    #[test]
    fn repeating_a_reaction_counts_again() {
        let mut store = MemoryStore::default();
        react(&mut store, "a.md", "like").unwrap();
        let r = react(&mut store, "a.md", "like").unwrap();
        assert_eq!(r.count("like"), 2);
    }

    #[test]
    fn keeps_custom_reactions() {
        let mut store = MemoryStore::default();
        let r = react(&mut store, "a.md", "rocket").unwrap();
        assert_eq!(r.counts.last(), Some(&("rocket".to_string(), 1)));
    }
}
