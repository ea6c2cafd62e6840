use std::{fmt::Write as _, sync::OnceLock};

use regex::{Regex, RegexBuilder};

use super::utils::strip_tags;

fn heading_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        RegexBuilder::new(r"<h([1-6])(\s[^>]*)?>(.*?)</h[1-6]>")
            .dot_matches_new_line(true)
            .build()
            .unwrap()
    })
}

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"\bid="([^"]*)""#).unwrap())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Heading {
    pub level: u8,
    pub id: String,
    pub text: String,
}

/// Headings of rendered HTML in document order. Headings without an `id`
/// cannot be linked to and are skipped.
pub(crate) fn extract_headings(html: &str) -> Vec<Heading> {
    heading_pattern()
        .captures_iter(html)
        .filter_map(|caps| {
            let level = caps[1].parse().ok()?;
            let attrs = caps.get(2)?.as_str();
            let id = id_pattern().captures(attrs)?[1].to_string();
            Some(Heading {
                level,
                id,
                text: strip_tags(&caps[3]).trim().to_string(),
            })
        })
        .collect()
}

/// Nested list of links to `headings`.
///
/// Going deeper opens exactly one list no matter how many levels are skipped;
/// going back up closes `current - new` lists (never more than are open).
pub(crate) fn render_toc(headings: &[Heading]) -> String {
    if headings.is_empty() {
        return String::new();
    }

    let mut toc = String::from("<ul class=\"toc-list\">");
    let mut current = 1u8;
    let mut open = 0usize;
    for heading in headings {
        if heading.level > current {
            toc.push_str("<ul>");
            open += 1;
        } else if heading.level < current {
            let close = usize::from(current - heading.level).min(open);
            for _ in 0..close {
                toc.push_str("</ul>");
            }
            open -= close;
        }
        current = heading.level;
        let _ = write!(
            toc,
            "<li><a href=\"#{}\">{}</a></li>",
            heading.id, heading.text
        );
    }
    for _ in 0..open {
        toc.push_str("</ul>");
    }
    toc.push_str("</ul>");
    toc
}

pub(crate) fn generate(html: &str) -> String {
    render_toc(&extract_headings(html))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headings(levels: &[u8]) -> Vec<Heading> {
        levels
            .iter()
            .enumerate()
            .map(|(i, &level)| Heading {
                level,
                id: format!("h{i}"),
                text: format!("Heading {i}"),
            })
            .collect()
    }

    fn nested_lists(toc: &str) -> usize {
        toc.matches("<ul>").count()
    }

    #[test]
    fn extracts_headings_with_ids() {
        let html = "<h1 id=\"top\">Top</h1><p>x</p><h2 class=\"c\" id=\"sub\">Sub <code>x</code></h2><h3>No id</h3>";
        let found = extract_headings(html);
        assert_eq!(
            found,
            vec![
                Heading { level: 1, id: "top".into(), text: "Top".into() },
                Heading { level: 2, id: "sub".into(), text: "Sub x".into() },
            ]
        );
    }

    #[test]
    fn no_headings_renders_nothing() {
        assert_eq!(generate("<p>plain</p>"), "");
    }

    #[test]
    fn nests_one_level_per_jump() {
        let toc = render_toc(&headings(&[1, 2, 2, 3, 2]));
        assert_eq!(nested_lists(&toc), 2);
        assert_eq!(toc.matches("<ul").count(), toc.matches("</ul>").count());
        assert_eq!(
            toc,
            "<ul class=\"toc-list\">\
             <li><a href=\"#h0\">Heading 0</a></li>\
             <ul><li><a href=\"#h1\">Heading 1</a></li>\
             <li><a href=\"#h2\">Heading 2</a></li>\
             <ul><li><a href=\"#h3\">Heading 3</a></li></ul>\
             <li><a href=\"#h4\">Heading 4</a></li></ul></ul>"
        );
    }

    #[test]
    fn skipped_levels_open_a_single_list() {
        let toc = render_toc(&headings(&[1, 3]));
        assert_eq!(nested_lists(&toc), 1);
        assert!(toc.starts_with("<ul class=\"toc-list\"><li><a href=\"#h0\">Heading 0</a></li><ul>"));
    }

    #[test]
    fn closing_never_exceeds_open_lists() {
        let toc = render_toc(&headings(&[1, 4, 1, 2]));
        assert_eq!(toc.matches("<ul").count(), toc.matches("</ul>").count());
        assert_eq!(nested_lists(&toc), 2);
    }

    #[test]
    fn generates_from_rendered_markdown() {
        let html = super::super::markdown::render("# A\n\n## B\n\ntext\n\n## C\n");
        let toc = generate(&html);
        assert!(toc.contains("<a href=\"#a\">A</a>"));
        assert!(toc.contains("<a href=\"#b\">B</a>"));
        assert!(toc.contains("<a href=\"#c\">C</a>"));
        assert_eq!(nested_lists(&toc), 1);
    }
}
