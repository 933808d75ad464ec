//! Line-level diff between two revisions of a page.
//!
//! The engine aligns the two sides on a longest common subsequence of lines,
//! found in linear space by divide and conquer. Lines that occur on only one
//! side are set aside first since they can never be matched. Between two
//! matched lines every removal is reported before any addition.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The type of a line in a diff result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiffLineType {
    Added,
    Removed,
    Unchanged,
}

impl DiffLineType {
    /// String representation for display and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Unchanged => "unchanged",
        }
    }
}

impl std::fmt::Display for DiffLineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single line in a diff result.
///
/// `Unchanged` lines carry both line numbers, `Removed` lines only the old
/// one and `Added` lines only the new one. Numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub line_type: DiffLineType,
    pub content: String,
    #[serde(default)]
    pub line_number_old: Option<usize>,
    #[serde(default)]
    pub line_number_new: Option<usize>,
}

impl DiffLine {
    /// A line present on both sides, at `old` and `new`.
    pub fn unchanged(content: &str, old: usize, new: usize) -> Self {
        Self {
            line_type: DiffLineType::Unchanged,
            content: content.to_string(),
            line_number_old: Some(old),
            line_number_new: Some(new),
        }
    }

    pub fn added(content: &str, new: usize) -> Self {
        Self {
            line_type: DiffLineType::Added,
            content: content.to_string(),
            line_number_old: None,
            line_number_new: Some(new),
        }
    }

    pub fn removed(content: &str, old: usize) -> Self {
        Self {
            line_type: DiffLineType::Removed,
            content: content.to_string(),
            line_number_old: Some(old),
            line_number_new: None,
        }
    }
}

/// Per-type line counts of a diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
}

impl DiffStats {
    pub fn of(lines: &[DiffLine]) -> Self {
        lines.iter().fold(Self::default(), |mut stats, line| {
            match line.line_type {
                DiffLineType::Added => stats.added += 1,
                DiffLineType::Removed => stats.removed += 1,
                DiffLineType::Unchanged => stats.unchanged += 1,
            }
            stats
        })
    }

    pub fn has_changes(&self) -> bool {
        self.added > 0 || self.removed > 0
    }
}

// ---------------------------------------------------------------------------
// Line splitting / reconstruction
// ---------------------------------------------------------------------------

/// Split text into lines on `\n`.
///
/// Unlike [`str::lines`] a trailing newline yields a final empty line, so
/// joining the result with `\n` gives back the input exactly. Empty text has
/// no lines.
pub fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        Vec::new()
    } else {
        text.split('\n').collect()
    }
}

/// Rebuild the old text from a diff (every line that is not `Added`).
pub fn reconstruct_old(lines: &[DiffLine]) -> String {
    join_where(lines, |t| t != DiffLineType::Added)
}

/// Rebuild the new text from a diff (every line that is not `Removed`).
pub fn reconstruct_new(lines: &[DiffLine]) -> String {
    join_where(lines, |t| t != DiffLineType::Removed)
}

fn join_where(lines: &[DiffLine], keep: impl Fn(DiffLineType) -> bool) -> String {
    lines
        .iter()
        .filter(|l| keep(l.line_type))
        .map(|l| l.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Diff computation
// ---------------------------------------------------------------------------

/// Compute a line-level diff between two texts.
///
/// Returns a list of [`DiffLine`] entries in document order indicating which
/// lines were added, removed, or left unchanged, with their line numbers.
pub fn compute_line_diff(old: &str, new: &str) -> Vec<DiffLine> {
    let old_lines = split_lines(old);
    let new_lines = split_lines(new);

    let prefix = old_lines
        .iter()
        .zip(&new_lines)
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = old_lines[prefix..]
        .iter()
        .rev()
        .zip(new_lines[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let old_end = old_lines.len() - suffix;
    let new_end = new_lines.len() - suffix;

    let mut result = Vec::with_capacity(old_lines.len().max(new_lines.len()));
    for (i, line) in old_lines[..prefix].iter().enumerate() {
        result.push(DiffLine::unchanged(line, i + 1, i + 1));
    }

    diff_hunk(
        &old_lines[prefix..old_end],
        &new_lines[prefix..new_end],
        prefix,
        &mut result,
    );

    for k in 0..suffix {
        result.push(DiffLine::unchanged(
            old_lines[old_end + k],
            old_end + k + 1,
            new_end + k + 1,
        ));
    }

    result
}

/// Diff the region between the common prefix and suffix. `offset` is the
/// number of lines before the region, identical on both sides.
fn diff_hunk(old: &[&str], new: &[&str], offset: usize, out: &mut Vec<DiffLine>) {
    let old_seen: HashSet<&str> = old.iter().copied().collect();
    let new_seen: HashSet<&str> = new.iter().copied().collect();
    let old_kept: Vec<usize> = (0..old.len()).filter(|&i| new_seen.contains(old[i])).collect();
    let new_kept: Vec<usize> = (0..new.len()).filter(|&j| old_seen.contains(new[j])).collect();
    let old_candidates: Vec<&str> = old_kept.iter().map(|&i| old[i]).collect();
    let new_candidates: Vec<&str> = new_kept.iter().map(|&j| new[j]).collect();

    let mut matches = Vec::new();
    common_lines(&old_candidates, &new_candidates, 0, 0, &mut matches);

    let mut i = 0;
    let mut j = 0;
    for (a, b) in matches {
        let (old_at, new_at) = (old_kept[a], new_kept[b]);
        push_change(old, new, (i, old_at), (j, new_at), offset, out);
        out.push(DiffLine::unchanged(old[old_at], offset + old_at + 1, offset + new_at + 1));
        i = old_at + 1;
        j = new_at + 1;
    }
    push_change(old, new, (i, old.len()), (j, new.len()), offset, out);
}

/// Emit the unmatched lines between two matches: removals, then additions.
fn push_change(
    old: &[&str],
    new: &[&str],
    (old_from, old_to): (usize, usize),
    (new_from, new_to): (usize, usize),
    offset: usize,
    out: &mut Vec<DiffLine>,
) {
    for i in old_from..old_to {
        out.push(DiffLine::removed(old[i], offset + i + 1));
    }
    for j in new_from..new_to {
        out.push(DiffLine::added(new[j], offset + j + 1));
    }
}

/// Collect the index pairs of a longest common subsequence of `a` and `b`,
/// in order, shifted by the given offsets.
///
/// Hirschberg's scheme: split `a` in half, find where the best alignment
/// crosses `b` from one forward and one backward length row, recurse on both
/// quarters. Memory stays proportional to `b`.
fn common_lines(
    a: &[&str],
    b: &[&str],
    a_offset: usize,
    b_offset: usize,
    out: &mut Vec<(usize, usize)>,
) {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    out.extend((0..prefix).map(|k| (a_offset + k, b_offset + k)));
    let (a, b) = (&a[prefix..], &b[prefix..]);
    let (a_offset, b_offset) = (a_offset + prefix, b_offset + prefix);

    let suffix = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let (a, b) = (&a[..a.len() - suffix], &b[..b.len() - suffix]);

    if a.is_empty() || b.is_empty() {
        // nothing left to align
    } else if a.len() == 1 {
        if let Some(j) = b.iter().position(|line| *line == a[0]) {
            out.push((a_offset, b_offset + j));
        }
    } else {
        let mid = a.len() / 2;
        let head = lcs_lengths(a[..mid].iter().copied(), b.iter().copied());
        let tail = lcs_lengths(a[mid..].iter().rev().copied(), b.iter().rev().copied());
        let n = b.len();
        let split = (0..=n)
            .max_by_key(|&j| head[j] + tail[n - j])
            .unwrap_or(0);
        common_lines(&a[..mid], &b[..split], a_offset, b_offset, out);
        common_lines(&a[mid..], &b[split..], a_offset + mid, b_offset + split, out);
    }

    out.extend((0..suffix).map(|k| (a_offset + a.len() + k, b_offset + b.len() + k)));
}

/// Last row of the LCS length table: entry `j` is the LCS length of all of
/// `a` against the first `j` lines of `b`.
fn lcs_lengths<'a>(
    a: impl Iterator<Item = &'a str>,
    b: impl Iterator<Item = &'a str> + Clone,
) -> Vec<u32> {
    let width = b.clone().count() + 1;
    let mut previous = vec![0u32; width];
    let mut current = vec![0u32; width];
    for x in a {
        for (j, y) in b.clone().enumerate() {
            current[j + 1] = if x == y {
                previous[j] + 1
            } else {
                previous[j + 1].max(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Check a diff produced elsewhere against the two texts it claims to compare.
///
/// The diff must reconstruct both texts and number its lines consecutively
/// from 1 on each side, with each line type carrying exactly the numbers it
/// is entitled to.
pub fn verify_diff(old: &str, new: &str, lines: &[DiffLine]) -> Result<(), CoreError> {
    if reconstruct_old(lines) != old {
        return Err(CoreError::Validation(
            "Diff does not reconstruct the old revision".into(),
        ));
    }
    if reconstruct_new(lines) != new {
        return Err(CoreError::Validation(
            "Diff does not reconstruct the new revision".into(),
        ));
    }

    let mut next_old = 1;
    let mut next_new = 1;
    for (index, line) in lines.iter().enumerate() {
        let ok = match line.line_type {
            DiffLineType::Unchanged => {
                line.line_number_old == Some(next_old) && line.line_number_new == Some(next_new)
            }
            DiffLineType::Removed => {
                line.line_number_old == Some(next_old) && line.line_number_new.is_none()
            }
            DiffLineType::Added => {
                line.line_number_old.is_none() && line.line_number_new == Some(next_new)
            }
        };
        if !ok {
            return Err(CoreError::Validation(format!(
                "Diff line {} ({}) has inconsistent line numbers",
                index + 1,
                line.line_type
            )));
        }
        if line.line_type != DiffLineType::Added {
            next_old += 1;
        }
        if line.line_type != DiffLineType::Removed {
            next_new += 1;
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
