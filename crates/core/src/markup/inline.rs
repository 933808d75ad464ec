//! Inline span resolution: code, links, bold and italic.
//!
//! Spans are matched left to right. At a backtick only a code span is
//! tried, at `[` only a link, and at `*` bold is tried before italic so an
//! italic match can never swallow half of a bold marker. Bold and italic may
//! nest inside each other. Anything that does not close is kept as literal
//! text.

use super::link::LinkTarget;
use super::Inline;

pub(crate) fn parse_inline(text: &str) -> Vec<Inline> {
    let mut spans = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        let matched = match c {
            '`' => code_span(rest),
            '[' => link_span(rest),
            '*' => strong_span(rest).or_else(|| emphasis_span(rest)),
            _ => None,
        };

        match matched {
            Some((found, after)) => {
                flush_literal(&mut literal, &mut spans);
                for span in found {
                    push_span(&mut spans, span);
                }
                rest = after;
            }
            None => {
                literal.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }

    flush_literal(&mut literal, &mut spans);
    spans
}

type SpanMatch<'a> = Option<(Vec<Inline>, &'a str)>;

/// `` `code` `` with non-empty content. Content is never parsed further.
fn code_span(rest: &str) -> SpanMatch<'_> {
    let body = rest.strip_prefix('`')?;
    let end = body.find('`')?;
    if end == 0 {
        return None;
    }
    Some((
        vec![Inline::Code {
            text: body[..end].to_string(),
        }],
        &body[end + 1..],
    ))
}

/// `[label](target)`. A target that classifies to nothing leaves only the
/// label text behind.
fn link_span(rest: &str) -> SpanMatch<'_> {
    let body = rest.strip_prefix('[')?;
    let label_end = body.find(']')?;
    if label_end == 0 {
        return None;
    }
    let label = &body[..label_end];
    let after_label = body[label_end + 1..].strip_prefix('(')?;
    let target_end = after_label.find(')')?;
    if target_end == 0 {
        return None;
    }
    let target = &after_label[..target_end];
    let after = &after_label[target_end + 1..];

    let children = parse_inline(label);
    match LinkTarget::classify(target) {
        Some(target) => Some((vec![Inline::Link { children, target }], after)),
        None => Some((children, after)),
    }
}

/// `**bold**`. Italic spans inside are skipped when looking for the close.
fn strong_span(rest: &str) -> SpanMatch<'_> {
    let body = rest.strip_prefix("**")?;
    let end = strong_close(body)?;
    if end == 0 {
        return None;
    }
    Some((
        vec![Inline::Strong {
            children: parse_inline(&body[..end]),
        }],
        &body[end + 2..],
    ))
}

/// `*italic*`. Bold spans inside are skipped when looking for the close.
fn emphasis_span(rest: &str) -> SpanMatch<'_> {
    let body = rest.strip_prefix('*')?;
    let end = emphasis_close(body)?;
    if end == 0 {
        return None;
    }
    Some((
        vec![Inline::Emphasis {
            children: parse_inline(&body[..end]),
        }],
        &body[end + 1..],
    ))
}

/// Offset of the `**` closing a bold span.
fn strong_close(body: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(offset) = body[from..].find('*') {
        let at = from + offset;
        if body[at..].starts_with("**") {
            return Some(at);
        }
        // A lone `*` opens an italic span if a lone `*` closes it before the
        // bold ends; otherwise it is literal.
        let after = at + 1;
        from = match body[after..].find('*') {
            Some(close) if !body[after + close..].starts_with("**") => after + close + 1,
            _ => after,
        };
    }
    None
}

/// Offset of the `*` closing an italic span.
fn emphasis_close(body: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(offset) = body[from..].find('*') {
        let at = from + offset;
        if body[at..].starts_with("**") {
            if let Some(close) = body[at + 2..].find("**").filter(|&close| close > 0) {
                from = at + 2 + close + 2;
                continue;
            }
        }
        return Some(at);
    }
    None
}

fn flush_literal(literal: &mut String, spans: &mut Vec<Inline>) {
    if !literal.is_empty() {
        push_span(spans, Inline::Text {
            text: std::mem::take(literal),
        });
    }
}

/// Append a span, merging adjacent text.
fn push_span(spans: &mut Vec<Inline>, span: Inline) {
    if let Inline::Text { text } = &span {
        if let Some(Inline::Text { text: previous }) = spans.last_mut() {
            previous.push_str(text);
            return;
        }
    }
    spans.push(span);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
