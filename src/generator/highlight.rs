use std::sync::OnceLock;

use log::warn;
use syntect::{
    html::{ClassStyle, ClassedHTMLGenerator},
    parsing::{SyntaxReference, SyntaxSet},
    util::LinesWithEndings,
};

use super::utils::escape_xml;

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

/// Known language by name or extension, else a guess from the first line.
fn find_syntax<'a>(set: &'a SyntaxSet, lang: Option<&str>, code: &str) -> &'a SyntaxReference {
    lang.and_then(|lang| set.find_syntax_by_token(lang))
        .or_else(|| set.find_syntax_by_first_line(code))
        .unwrap_or_else(|| set.find_syntax_plain_text())
}

fn highlight_lines(code: &str, syntax: &SyntaxReference) -> Result<String, syntect::Error> {
    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, syntax_set(), ClassStyle::Spaced);
    for line in LinesWithEndings::from(code) {
        generator.parse_html_for_line_which_includes_newline(line)?;
    }
    Ok(generator.finalize())
}

/// A fenced or indented code block as `<pre><code>`, tokens wrapped in
/// classed spans. Falls back to escaped plain text if highlighting fails.
pub(crate) fn code_block(code: &str, lang: Option<&str>) -> String {
    let syntax = find_syntax(syntax_set(), lang, code);
    let body = highlight_lines(code, syntax).unwrap_or_else(|e| {
        warn!("Failed to highlight {} block: {e}", syntax.name);
        escape_xml(code)
    });
    match lang {
        Some(lang) => format!(
            "<pre><code class=\"language-{}\">{body}</code></pre>\n",
            escape_xml(lang)
        ),
        None => format!("<pre><code>{body}</code></pre>\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlights_known_language() {
        let html = code_block("fn main() {}\n", Some("rust"));
        assert!(html.starts_with("<pre><code class=\"language-rust\">"));
        assert!(html.contains("<span class=\"source rust\">"));
        assert!(html.contains("main"));
    }

    #[test]
    fn looks_up_by_extension() {
        let html = code_block("x = 1\n", Some("py"));
        assert!(html.contains("<span class=\"source python\">"));
    }

    #[test]
    fn unknown_language_is_escaped_plain_text() {
        let html = code_block("a < b && c\n", Some("nosuchlang"));
        assert!(html.starts_with("<pre><code class=\"language-nosuchlang\">"));
        assert!(html.contains("a &lt; b &amp;&amp; c"));
        assert!(!html.contains("a < b"));
    }
}
