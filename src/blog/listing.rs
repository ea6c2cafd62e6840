use std::cmp::Ordering;

use crate::metadata::Post;

pub(crate) const RECENT_LIMIT: usize = 5;
pub(crate) const RELATED_LIMIT: usize = 3;

/// Posts whose title, any tag, or body contains `term`, ignoring case. An
/// empty term matches everything.
pub(crate) fn search<'a>(posts: &'a [Post], term: &str) -> Vec<&'a Post> {
    let term = term.trim().to_lowercase();
    posts
        .iter()
        .filter(|post| {
            term.is_empty()
                || post.title.to_lowercase().contains(&term)
                || post.tags.iter().any(|t| t.to_lowercase().contains(&term))
                || post.content.to_lowercase().contains(&term)
        })
        .collect()
}

/// Clicking a tag searches for it.
pub(crate) fn filter_by_tag<'a>(posts: &'a [Post], tag: &str) -> Vec<&'a Post> {
    search(posts, tag)
}

fn newest_first(a: &Post, b: &Post) -> Ordering {
    match (a.date_value(), b.date_value()) {
        (Some(a_date), Some(b_date)) => b_date.cmp(&a_date),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub(crate) fn recent(posts: &[Post], limit: usize) -> Vec<&Post> {
    let mut posts: Vec<&Post> = posts.iter().collect();
    posts.sort_by(|a, b| newest_first(a, b));
    posts.truncate(limit);
    posts
}

/// Tag usage counts, in the order tags are first seen.
pub(crate) fn tag_cloud(posts: &[Post]) -> Vec<(String, usize)> {
    let mut cloud: Vec<(String, usize)> = vec![];
    for tag in posts.iter().flat_map(|p| p.tags.iter()) {
        match cloud.iter_mut().find(|(t, _)| t == tag) {
            Some((_, count)) => *count += 1,
            None => cloud.push((tag.clone(), 1)),
        }
    }
    cloud
}

/// Other posts sharing tags with `current`, most shared tags first.
pub(crate) fn related<'a>(posts: &'a [Post], current: &Post) -> Vec<&'a Post> {
    let mut scored: Vec<(usize, &Post)> = posts
        .iter()
        .filter(|post| post.file != current.file)
        .map(|post| {
            let score = current
                .tags
                .iter()
                .filter(|tag| post.tags.contains(tag))
                .count();
            (score, post)
        })
        .filter(|(score, _)| *score > 0)
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .take(RELATED_LIMIT)
        .map(|(_, post)| post)
        .collect()
}
