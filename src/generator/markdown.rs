use pulldown_cmark::{html, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use super::{highlight, utils::Slugger};

/// Renders markdown to HTML. Headings without an explicit `{#id}` get a slug
/// id so the table of contents can link to them, and code blocks are
/// syntax highlighted.
pub(crate) fn render(body: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

    let mut events: Vec<Event> = Parser::new_ext(body, options).collect();
    attach_heading_ids(&mut events);

    let mut body_html = String::new();
    html::push_html(&mut body_html, highlight_code_blocks(events));
    body_html
}

fn attach_heading_ids(events: &mut [Event]) {
    let mut slugger = Slugger::default();
    for i in 0..events.len() {
        if !matches!(events[i], Event::Start(Tag::Heading { id: None, .. })) {
            continue;
        }
        let mut text = String::new();
        for event in &events[i + 1..] {
            match event {
                Event::End(TagEnd::Heading(_)) => break,
                Event::Text(t) | Event::Code(t) => text.push_str(t),
                _ => {}
            }
        }
        let slug = slugger.slug(&text);
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
            *id = Some(slug.into());
        }
    }
}

/// Replaces each code block with its highlighted HTML.
fn highlight_code_blocks<'a>(events: Vec<Event<'a>>) -> impl Iterator<Item = Event<'a>> {
    let mut out = Vec::with_capacity(events.len());
    let mut code: Option<(Option<String>, String)> = None;
    for event in events {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info.split_whitespace().next().map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                code = Some((lang, String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((lang, buf)) = code.take() {
                    out.push(Event::Html(highlight::code_block(&buf, lang.as_deref()).into()));
                }
            }
            Event::Text(text) if code.is_some() => {
                if let Some((_, buf)) = code.as_mut() {
                    buf.push_str(&text);
                }
            }
            event => out.push(event),
        }
    }
    out.into_iter()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_get_ids() {
        let html = render("# Intro\n\n## Setup `cargo`\n\n## Intro\n");
        assert!(html.contains("<h1 id=\"intro\">Intro</h1>"));
        assert!(html.contains("<h2 id=\"setup-cargo\">"));
        assert!(html.contains("<h2 id=\"intro-1\">Intro</h2>"));
    }

    #[test]
    fn code_blocks_are_highlighted() {
        let html = render("# Code\n\n```rust\nlet x = 1;\n```\n\n    plain <indented>\n");
        assert!(html.contains("<pre><code class=\"language-rust\"><span class=\"source rust\">"));
        assert!(html.contains("<pre><code><span"));
        assert!(html.contains("&lt;indented&gt;"));
        assert!(html.contains("<h1 id=\"code\">Code</h1>"));
    }

    #[test]
    fn explicit_ids_are_kept() {
        let html = render("## Custom {#my-id}\n");
        assert!(html.contains("id=\"my-id\""));
    }

    #[test]
    fn renders_tables_and_strikethrough() {
        let html = render("~~old~~\n\n| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<del>old</del>"));
        assert!(html.contains("<table>"));
    }
}
