use std::sync::OnceLock;

use maud::{html, PreEscaped};
use regex::{Captures, Regex, RegexBuilder};

fn block_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        RegexBuilder::new(r":::(warning|tip|info|danger)\s+(.*?):::")
            .dot_matches_new_line(true)
            .build()
            .unwrap()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockKind {
    Warning,
    Tip,
    Info,
    Danger,
}

impl BlockKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "warning" => Some(Self::Warning),
            "tip" => Some(Self::Tip),
            "info" => Some(Self::Info),
            "danger" => Some(Self::Danger),
            _ => None,
        }
    }

    pub fn class(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Tip => "tip",
            Self::Info => "info",
            Self::Danger => "danger",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Warning => "Peringatan",
            Self::Tip => "Tips",
            Self::Info => "Info",
            Self::Danger => "Bahaya",
        }
    }
}

/// Expands `:::kind body :::` callouts into styled containers. An unclosed
/// callout is left as it is.
pub(crate) fn transform(html: &str) -> String {
    block_pattern()
        .replace_all(html, |caps: &Captures| {
            let Some(kind) = BlockKind::from_name(&caps[1]) else {
                return caps[0].to_string();
            };
            render_block(kind, caps[2].trim())
        })
        .into_owned()
}

fn render_block(kind: BlockKind, body: &str) -> String {
    html! {
        div.custom-block.{ (kind.class()) } {
            p.custom-block-title { (kind.label()) }
            div.custom-block-content { (PreEscaped(body)) }
        }
    }
    .into_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transforms_tip() {
        let out = transform(":::tip Remember this :::");
        assert_eq!(
            out,
            "<div class=\"custom-block tip\"><p class=\"custom-block-title\">Tips</p>\
             <div class=\"custom-block-content\">Remember this</div></div>"
        );
    }

    #[test]
    fn unterminated_block_passes_through() {
        let input = ":::tip Remember this";
        assert_eq!(transform(input), input);
    }

    #[test]
    fn unclosed_block_ends_at_next_opening() {
        let out = transform(":::tip A\n\n:::info B :::");
        assert_eq!(
            out,
            "<div class=\"custom-block tip\"><p class=\"custom-block-title\">Tips</p>\
             <div class=\"custom-block-content\">A</div></div>info B :::"
        );
    }

    #[test]
    fn unknown_kind_passes_through() {
        let input = ":::note hello :::";
        assert_eq!(transform(input), input);
    }

    #[test]
    fn spans_lines_and_stops_at_first_close() {
        let input = "<p>:::warning\nCareful <em>now</em>\n:::</p>\n<p>:::danger Boom :::</p>";
        let out = transform(input);
        assert!(out.contains("<div class=\"custom-block warning\"><p class=\"custom-block-title\">Peringatan</p><div class=\"custom-block-content\">Careful <em>now</em></div></div>"));
        assert!(out.contains("<div class=\"custom-block danger\">"));
        assert!(out.contains("Bahaya"));
        assert!(!out.contains(":::"));
    }
}
