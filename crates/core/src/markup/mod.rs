//! Lightweight wiki markup compiler.
//!
//! [`compile`] turns page source text into [`StructuredContent`]: a list of
//! block nodes whose text is split into inline spans, with every link
//! classified as internal or external and every heading carrying an anchor
//! id. The pipeline runs in fixed stages:
//!
//! 1. [`block::extract_fences`] cuts fenced code out of the source, so no
//!    later stage ever sees code as markup.
//! 2. [`block::build_blocks`] segments the remaining text into headings,
//!    lists and paragraphs.
//! 3. [`inline::parse_inline`] resolves code, link, bold and italic spans
//!    inside each block.
//!
//! Compilation is total: malformed markup degrades to literal text.

mod block;
mod html;
mod inline;
mod link;

use serde::Serialize;

pub use block::anchor_id;
pub use html::escape_html;
pub use link::LinkTarget;

/// Shown in place of a page with no content.
pub const EMPTY_PAGE_MESSAGE: &str = "This page is empty. Click Edit to add content.";

// ---------------------------------------------------------------------------
// Node types
// ---------------------------------------------------------------------------

/// A block-level node of compiled page content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Placeholder for an empty or whitespace-only page.
    EmptyPage,
    Heading {
        level: u8,
        anchor: String,
        content: Vec<Inline>,
    },
    /// Lines of a paragraph, rendered with explicit line breaks between them.
    Paragraph { lines: Vec<Vec<Inline>> },
    List { items: Vec<Vec<Inline>> },
    Code {
        language: Option<String>,
        text: String,
    },
}

/// An inline span inside a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    Text { text: String },
    Strong { children: Vec<Inline> },
    Emphasis { children: Vec<Inline> },
    Code { text: String },
    Link {
        children: Vec<Inline>,
        target: LinkTarget,
    },
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// The span's visible text with all formatting removed.
    pub fn plain_text(&self) -> String {
        match self {
            Self::Text { text } | Self::Code { text } => text.clone(),
            Self::Strong { children } | Self::Emphasis { children } | Self::Link { children, .. } => {
                plain_text(children)
            }
        }
    }
}

fn plain_text(inlines: &[Inline]) -> String {
    inlines.iter().map(Inline::plain_text).collect()
}

/// A heading entry of the page outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingRef {
    pub level: u8,
    pub text: String,
    pub anchor: String,
}

// ---------------------------------------------------------------------------
// StructuredContent
// ---------------------------------------------------------------------------

/// The compiled form of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuredContent {
    pub blocks: Vec<Block>,
}

impl StructuredContent {
    pub fn is_empty_page(&self) -> bool {
        matches!(self.blocks.as_slice(), [Block::EmptyPage])
    }

    /// Page outline in document order.
    pub fn headings(&self) -> Vec<HeadingRef> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Heading {
                    level,
                    anchor,
                    content,
                } => Some(HeadingRef {
                    level: *level,
                    text: plain_text(content),
                    anchor: anchor.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Whether some heading of this page carries the given anchor id.
    pub fn has_anchor(&self, anchor: &str) -> bool {
        self.blocks
            .iter()
            .any(|block| matches!(block, Block::Heading { anchor: a, .. } if a == anchor))
    }

    /// Every link target on the page, in document order.
    pub fn links(&self) -> Vec<&LinkTarget> {
        let mut found = Vec::new();
        for block in &self.blocks {
            match block {
                Block::Heading { content, .. } => collect_links(content, &mut found),
                Block::Paragraph { lines } => {
                    lines.iter().for_each(|line| collect_links(line, &mut found))
                }
                Block::List { items } => {
                    items.iter().for_each(|item| collect_links(item, &mut found))
                }
                Block::EmptyPage | Block::Code { .. } => {}
            }
        }
        found
    }

    /// Render to escaped HTML.
    pub fn to_html(&self) -> String {
        html::render(self)
    }
}

fn collect_links<'a>(inlines: &'a [Inline], found: &mut Vec<&'a LinkTarget>) {
    for inline in inlines {
        match inline {
            Inline::Link { children, target } => {
                found.push(target);
                collect_links(children, found);
            }
            Inline::Strong { children } | Inline::Emphasis { children } => {
                collect_links(children, found)
            }
            Inline::Text { .. } | Inline::Code { .. } => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Compile page source text into structured content.
pub fn compile(source: &str) -> StructuredContent {
    if source.trim().is_empty() {
        return StructuredContent {
            blocks: vec![Block::EmptyPage],
        };
    }

    let segments = block::extract_fences(source);
    StructuredContent {
        blocks: block::build_blocks(&segments),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_is_empty_page() {
        assert!(compile("").is_empty_page());
        assert!(compile("  \n\t\n").is_empty_page());
    }

    #[test]
    fn plain_text_is_single_paragraph() {
        let content = compile("just some words\nand another line");
        assert_eq!(
            content.blocks,
            vec![Block::Paragraph {
                lines: vec![
                    vec![Inline::text("just some words")],
                    vec![Inline::text("and another line")],
                ]
            }]
        );
    }

    #[test]
    fn heading_anchor_is_deterministic() {
        let first = compile("## Hello, World!");
        let second = compile("## Hello, World!");
        assert_eq!(first, second);
        assert_eq!(
            first.headings(),
            vec![HeadingRef {
                level: 2,
                text: "Hello, World!".into(),
                anchor: "hello-world".into(),
            }]
        );
    }

    #[test]
    fn code_fence_is_not_interpreted() {
        let content = compile("```js\nconst a = 1;\n```");
        assert_eq!(
            content.blocks,
            vec![Block::Code {
                language: Some("js".into()),
                text: "const a = 1;".into(),
            }]
        );
        assert_eq!(content.to_html(), "<pre><code class=\"language-js\">const a = 1;</code></pre>");
    }

    #[test]
    fn code_fence_hides_markup_from_later_stages() {
        let content = compile("```\n# not a heading\n* not a list\n**x**\n```");
        assert!(content.headings().is_empty());
        assert_eq!(
            content.blocks,
            vec![Block::Code {
                language: None,
                text: "# not a heading\n* not a list\n**x**".into(),
            }]
        );
    }

    #[test]
    fn document_with_every_block_kind() {
        let source = "# Home\n\nWelcome to **the** wiki.\nSee [Guide](Guide#setup).\n\n* one\n* two\n\n```\nlet x = 1 < 2;\n```";
        let content = compile(source);
        assert_eq!(content.blocks.len(), 4);
        assert!(content.has_anchor("home"));
        assert_eq!(
            content.links(),
            vec![&LinkTarget::Internal {
                path: Some("Guide".into()),
                anchor: Some("setup".into()),
            }]
        );
        assert!(matches!(&content.blocks[2], Block::List { items } if items.len() == 2));
        assert!(content.to_html().contains("let x = 1 &lt; 2;"));
    }

    #[test]
    fn links_are_collected_from_nested_spans() {
        let content = compile("**[a](https://a.example)** and *[b](B)*");
        let links = content.links();
        assert_eq!(links.len(), 2);
        assert!(links[0].is_external());
        assert_eq!(links[1].page_path(), Some("B"));
    }
}
