//! Markdown → HTML for the literature review.
//!
//! Model output is untrusted. Raw HTML is emitted as escaped text and links
//! survive only for web and mail schemes.

use pulldown_cmark::{html, Event, Options, Parser, Tag, TagEnd};

const SAFE_SCHEMES: [&str; 3] = ["https://", "http://", "mailto:"];

pub fn review_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut in_unsafe_link = false;
    let events = Parser::new_ext(markdown, options).filter_map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Some(Event::Text(raw)),
        Event::Start(Tag::Link { dest_url, .. }) if !is_safe_url(&dest_url) => {
            in_unsafe_link = true;
            None
        }
        Event::End(TagEnd::Link) if in_unsafe_link => {
            in_unsafe_link = false;
            None
        }
        // Images are reduced to their alt text.
        Event::Start(Tag::Image { .. }) | Event::End(TagEnd::Image) => None,
        other => Some(other),
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

fn is_safe_url(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    SAFE_SCHEMES.iter().any(|s| lower.starts_with(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_markdown() {
        let html = review_to_html("Recent work by **Doe** (2026) *extends* prior models.\n\n- one\n- two");
        assert!(html.contains("<strong>Doe</strong>"));
        assert!(html.contains("<em>extends</em>"));
        assert!(html.contains("<li>one</li>"));
    }

    #[test]
    fn test_doi_links_survive() {
        let html = review_to_html("See [Doe, 2026](https://doi.org/10.1000/x).");
        assert!(html.contains(r#"<a href="https://doi.org/10.1000/x">Doe, 2026</a>"#));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = review_to_html("Hello <script>alert(1)</script> world\n\n<div onclick=\"x\">block</div>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<div"));
    }

    #[test]
    fn test_unsafe_link_keeps_text_only() {
        let html = review_to_html("[click](javascript:alert(1))");
        assert!(!html.contains("javascript:"));
        assert!(!html.contains("<a "));
        assert!(html.contains("click"));
    }
}
