//! HTML rendering of compiled content.
//!
//! All text is escaped. Internal links never carry their raw target in
//! `href`; the page and anchor travel in `data-wiki-*` attributes so the
//! host decides how to navigate.

use super::{Block, Inline, LinkTarget, StructuredContent, EMPTY_PAGE_MESSAGE};

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn render(content: &StructuredContent) -> String {
    content
        .blocks
        .iter()
        .map(render_block)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_block(block: &Block) -> String {
    match block {
        Block::EmptyPage => format!("<p>{}</p>", escape_html(EMPTY_PAGE_MESSAGE)),
        Block::Heading {
            level,
            anchor,
            content,
        } => format!(
            "<h{level} id=\"{}\">{}</h{level}>",
            escape_html(anchor),
            render_inlines(content)
        ),
        Block::Paragraph { lines } => {
            let lines: Vec<String> = lines.iter().map(|line| render_inlines(line)).collect();
            format!("<p>{}</p>", lines.join("<br>"))
        }
        Block::List { items } => {
            let items: String = items
                .iter()
                .map(|item| format!("<li>{}</li>", render_inlines(item)))
                .collect();
            format!("<ul>{items}</ul>")
        }
        Block::Code { language, text } => match language {
            Some(language) => format!(
                "<pre><code class=\"language-{}\">{}</code></pre>",
                escape_html(language),
                escape_html(text)
            ),
            None => format!("<pre><code>{}</code></pre>", escape_html(text)),
        },
    }
}

fn render_inlines(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        render_inline(inline, &mut out);
    }
    out
}

fn render_inline(inline: &Inline, out: &mut String) {
    match inline {
        Inline::Text { text } => out.push_str(&escape_html(text)),
        Inline::Code { text } => {
            out.push_str("<code>");
            out.push_str(&escape_html(text));
            out.push_str("</code>");
        }
        Inline::Strong { children } => {
            out.push_str("<strong>");
            out.push_str(&render_inlines(children));
            out.push_str("</strong>");
        }
        Inline::Emphasis { children } => {
            out.push_str("<em>");
            out.push_str(&render_inlines(children));
            out.push_str("</em>");
        }
        Inline::Link { children, target } => {
            out.push_str(&link_open_tag(target));
            out.push_str(&render_inlines(children));
            out.push_str("</a>");
        }
    }
}

fn link_open_tag(target: &LinkTarget) -> String {
    match target {
        LinkTarget::External { url } => format!(
            "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">",
            escape_html(url)
        ),
        LinkTarget::Internal { path, anchor } => {
            let mut tag = format!(
                "<a href=\"#{}\"",
                escape_html(anchor.as_deref().unwrap_or_default())
            );
            if let Some(path) = path {
                tag.push_str(&format!(" data-wiki-path=\"{}\"", escape_html(path)));
            }
            if let Some(anchor) = anchor {
                tag.push_str(&format!(" data-wiki-anchor=\"{}\"", escape_html(anchor)));
            }
            tag.push('>');
            tag
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::markup::compile;

    use super::*;

    #[test]
    fn escapes_special_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn empty_page_message() {
        assert_eq!(
            compile("").to_html(),
            "<p>This page is empty. Click Edit to add content.</p>"
        );
    }

    #[test]
    fn raw_html_in_text_is_escaped() {
        let html = compile("<script>alert(1)</script>").to_html();
        assert_eq!(html, "<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>");
    }

    #[test]
    fn paragraph_lines_use_line_breaks() {
        assert_eq!(compile("a\nb").to_html(), "<p>a<br>b</p>");
    }

    #[test]
    fn heading_list_and_formatting() {
        let html = compile("## Getting Started\n\n* **bold**\n* *it* `x`").to_html();
        assert_eq!(
            html,
            "<h2 id=\"getting-started\">Getting Started</h2>\n\
             <ul><li><strong>bold</strong></li><li><em>it</em> <code>x</code></li></ul>"
        );
    }

    #[test]
    fn nested_formatting_renders_nested_tags() {
        assert_eq!(
            compile("**a *b* c**").to_html(),
            "<p><strong>a <em>b</em> c</strong></p>"
        );
    }

    #[test]
    fn external_link_is_isolated() {
        let html = compile("[site](https://example.com)").to_html();
        assert_eq!(
            html,
            "<p><a href=\"https://example.com\" target=\"_blank\" rel=\"noopener noreferrer\">site</a></p>"
        );
    }

    #[test]
    fn internal_link_carries_data_attributes() {
        let html = compile("[g](Guide#setup)").to_html();
        assert_eq!(
            html,
            "<p><a href=\"#setup\" data-wiki-path=\"Guide\" data-wiki-anchor=\"setup\">g</a></p>"
        );
    }

    #[test]
    fn internal_link_never_exposes_raw_target() {
        let html = compile("[x](javascript:alert(1))").to_html();
        assert!(!html.contains("href=\"javascript"));
        assert!(html.contains("data-wiki-path=\"javascript:alert(1\""));
    }
}
