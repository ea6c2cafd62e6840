use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

const EXCERPT_LENGTH: usize = 150;

fn header_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // `---` line, metadata block, `---` line, then the rest of the file
    PATTERN.get_or_init(|| {
        RegexBuilder::new(r"\A---\s*\n(.*?)\n---\s*\n(.*)\z")
            .dot_matches_new_line(true)
            .build()
            .unwrap()
    })
}

fn excerpt_noise() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[#*`\[\]()]").unwrap())
}

/// Ordered `key: value` pairs of a metadata block.
///
/// Every key is kept, but callers only interpret a handful of them. When a key
/// is declared twice the later declaration wins on lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Frontmatter {
    fields: Vec<(String, String)>,
}

impl Frontmatter {
    fn from_block(block: &str) -> Self {
        let fields = block
            .split('\n')
            .filter_map(|line| {
                let (key, value) = line.split_once(':')?;
                Some((key.trim().to_string(), unquote(value.trim()).to_string()))
            })
            .collect();
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Like [`Frontmatter::get`], but an empty value counts as absent.
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    pub fn tags(&self) -> Vec<String> {
        match self.non_empty("tags") {
            Some(tags) => tags.split(',').map(|t| t.trim().to_string()).collect(),
            None => vec![],
        }
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// Drops one pair of surrounding quotes. A lone `"` unquotes to nothing.
fn unquote(value: &str) -> &str {
    if value.starts_with('"') && value.ends_with('"') {
        value.get(1..value.len() - 1).unwrap_or("")
    } else {
        value
    }
}

/// Splits `text` into its metadata block and body.
///
/// Returns `None` when the text does not start with a `---` delimited block;
/// callers fall back to metadata derived from the filename.
pub(crate) fn split(text: &str) -> Option<(Frontmatter, &str)> {
    let caps = header_pattern().captures(text)?;
    let block = caps.get(1).map_or("", |m| m.as_str());
    let body = caps.get(2).map_or("", |m| m.as_str());
    Some((Frontmatter::from_block(block), body))
}

/// Plain-ish preview of a post body: markdown punctuation removed, cut at
/// 150 characters with a trailing `...` when something was cut.
pub(crate) fn excerpt(body: &str) -> String {
    let plain = excerpt_noise().replace_all(body, "");
    let mut chars = plain.chars();
    let mut excerpt: String = chars.by_ref().take(EXCERPT_LENGTH).collect();
    if chars.next().is_some() {
        excerpt.push_str("...");
    }
    excerpt
}

/// Writes a post back into the frontmatter format the parser reads.
pub(crate) fn to_markdown(title: &str, date: &str, tags: &[String], body: &str) -> String {
    let mut markdown = String::from("---\n");
    markdown.push_str(&format!("title: \"{title}\"\n"));
    markdown.push_str(&format!("date: \"{date}\"\n"));
    if !tags.is_empty() {
        markdown.push_str(&format!("tags: \"{}\"\n", tags.join(", ")));
    }
    markdown.push_str("---\n\n");
    markdown.push_str(body);
    markdown
}
