//! Fence extraction and block segmentation.

use super::inline::parse_inline;
use super::{Block, Inline};

const FENCE: &str = "```";

/// Deepest heading level recognised (`###`).
const MAX_HEADING_LEVEL: usize = 3;

/// A piece of source text: either markup or the body of a code fence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Text(&'a str),
    Fence {
        language: Option<String>,
        code: String,
    },
}

// ---------------------------------------------------------------------------
// Stage 1: fences
// ---------------------------------------------------------------------------

/// Split the source into markup text and fenced code.
///
/// Fences pair up in order of appearance; an opening fence with no closing
/// fence is left in the text as literal backticks.
pub(crate) fn extract_fences(source: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut rest = source;

    while let Some(open) = rest.find(FENCE) {
        let body_start = open + FENCE.len();
        let Some(close) = rest[body_start..].find(FENCE) else {
            break;
        };
        if open > 0 {
            segments.push(Segment::Text(&rest[..open]));
        }
        segments.push(fence_segment(&rest[body_start..body_start + close]));
        rest = &rest[body_start + close + FENCE.len()..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Text(rest));
    }
    segments
}

/// Strip the optional language tag and the newlines hugging the fence.
///
/// A tag is a run of word characters ending in a newline, so a one-line
/// fence such as ```` ```x + 1``` ```` is all code.
fn fence_segment(body: &str) -> Segment<'static> {
    let tag_len = body
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(body.len());
    let (tag, after_tag) = body.split_at(tag_len);

    let (language, code) = match strip_leading_newline(after_tag) {
        Some(code) => ((!tag.is_empty()).then(|| tag.to_string()), code),
        None => (None, body),
    };

    let code = code
        .strip_suffix("\r\n")
        .or_else(|| code.strip_suffix('\n'))
        .unwrap_or(code);

    Segment::Fence {
        language,
        code: code.to_string(),
    }
}

fn strip_leading_newline(text: &str) -> Option<&str> {
    text.strip_prefix("\r\n").or_else(|| text.strip_prefix('\n'))
}

// ---------------------------------------------------------------------------
// Stage 2: blocks
// ---------------------------------------------------------------------------

/// Build block nodes from extracted segments.
pub(crate) fn build_blocks(segments: &[Segment<'_>]) -> Vec<Block> {
    let mut blocks = Vec::new();
    for segment in segments {
        match segment {
            Segment::Fence { language, code } => blocks.push(Block::Code {
                language: language.clone(),
                text: code.clone(),
            }),
            Segment::Text(text) => text_blocks(text, &mut blocks),
        }
    }
    blocks
}

/// Segment markup text on blank lines, then split each unit into heading,
/// list and paragraph blocks.
fn text_blocks(text: &str, blocks: &mut Vec<Block>) {
    let mut unit: Vec<&str> = Vec::new();
    for raw in text.split('\n') {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if line.trim().is_empty() {
            unit_blocks(&unit, blocks);
            unit.clear();
        } else {
            unit.push(line);
        }
    }
    unit_blocks(&unit, blocks);
}

fn unit_blocks(lines: &[&str], blocks: &mut Vec<Block>) {
    let mut paragraph: Vec<Vec<Inline>> = Vec::new();
    let mut list: Vec<Vec<Inline>> = Vec::new();

    for line in lines {
        if let Some((level, text)) = parse_heading(line) {
            flush_paragraph(&mut paragraph, blocks);
            flush_list(&mut list, blocks);
            blocks.push(Block::Heading {
                level,
                anchor: anchor_id(text),
                content: parse_inline(text),
            });
        } else if let Some(item) = parse_list_item(line) {
            flush_paragraph(&mut paragraph, blocks);
            list.push(parse_inline(item));
        } else {
            flush_list(&mut list, blocks);
            paragraph.push(parse_inline(line));
        }
    }

    flush_paragraph(&mut paragraph, blocks);
    flush_list(&mut list, blocks);
}

fn flush_paragraph(lines: &mut Vec<Vec<Inline>>, blocks: &mut Vec<Block>) {
    if !lines.is_empty() {
        blocks.push(Block::Paragraph {
            lines: std::mem::take(lines),
        });
    }
}

fn flush_list(items: &mut Vec<Vec<Inline>>, blocks: &mut Vec<Block>) {
    if !items.is_empty() {
        blocks.push(Block::List {
            items: std::mem::take(items),
        });
    }
}

/// `# text`, `## text` or `### text`.
fn parse_heading(line: &str) -> Option<(u8, &str)> {
    let level = line.chars().take_while(|&c| c == '#').count();
    if level == 0 || level > MAX_HEADING_LEVEL {
        return None;
    }
    let text = line[level..].strip_prefix(' ')?;
    Some((level as u8, text.trim()))
}

/// `* text` with non-empty text.
fn parse_list_item(line: &str) -> Option<&str> {
    line.strip_prefix("* ").filter(|item| !item.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Anchors
// ---------------------------------------------------------------------------

/// Derive a heading's anchor id from its text.
///
/// Lower-cases, drops every character that is not a letter, digit,
/// whitespace or hyphen, then joins the remaining words with single hyphens.
/// Ids are not deduplicated across a page.
pub fn anchor_id(heading: &str) -> String {
    let kept: String = heading
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join("-")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
