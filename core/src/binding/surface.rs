//! The host boundary: what an editing surface must provide
//!
//! A surface is a live text widget (or an in-memory stand-in) that
//! reports edits as line/column change records, stores attribute
//! annotations over character ranges, and can draw remote cursors.
//! All indices are character offsets into the whole document.

use crate::ot::{Meta, Selection};
use serde::{Deserialize, Serialize};

/// Line/column position; `ch` counts characters within the line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub line: usize,
    pub ch: usize,
}

impl Pos {
    pub fn new(line: usize, ch: usize) -> Self {
        Self { line, ch }
    }
}

/// One raw edit as reported by the surface.
///
/// `from`/`to` address the replaced range in the coordinate system
/// before this change. `removed` and `text` are split on newlines, so an
/// insertion of `"a\nb"` is `["a", "b"]` and a pure deletion inserts
/// `[""]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawChange {
    pub from: Pos,
    pub to: Pos,
    pub removed: Vec<String>,
    pub text: Vec<String>,
    /// What produced the change; `None` marks programmatic edits (such as
    /// applying a remote operation) that must not be echoed back.
    pub origin: Option<String>,
}

impl RawChange {
    pub fn is_user_change(&self) -> bool {
        self.origin.is_some()
    }
}

pub type MarkId = u64;
pub type MarkerId = u64;

/// An attribute annotation over `[from, to)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    pub id: MarkId,
    pub from: usize,
    pub to: usize,
    pub meta: Meta,
}

/// Editing surface driven by the binding
pub trait Surface {
    /// Document length in characters
    fn len_chars(&self) -> usize;

    fn value(&self) -> String;

    /// Replace the whole document, dropping annotations and markers
    fn set_value(&mut self, text: &str);

    fn index_from_pos(&self, pos: Pos) -> usize;

    fn pos_from_index(&self, index: usize) -> Pos;

    /// Replace `[from, to)` with `text` without reporting a user change
    fn replace_range(&mut self, text: &str, from: Pos, to: Pos);

    /// Annotations overlapping `[from, to)`, ordered by start
    fn find_marks(&self, from: usize, to: usize) -> Vec<Mark>;

    fn mark_text(&mut self, from: usize, to: usize, meta: Meta) -> MarkId;

    fn clear_mark(&mut self, id: MarkId);

    fn selection(&self) -> Selection;

    fn set_selection(&mut self, selection: &Selection);

    /// Zero-width remote cursor at `index`
    fn add_cursor_marker(&mut self, index: usize, color: &str, client_id: &str) -> MarkerId;

    /// Highlighted remote selection over `[from, to)`
    fn add_selection_marker(&mut self, from: usize, to: usize, color: &str, client_id: &str) -> MarkerId;

    fn clear_marker(&mut self, id: MarkerId);
}

/// Split `[from, to)` into spans of uniform metadata. Text no annotation
/// covers is reported with empty metadata.
pub fn annotated_spans<S: Surface + ?Sized>(surface: &S, from: usize, to: usize) -> Vec<(usize, Meta)> {
    let mut spans = Vec::new();
    let mut covered = from;
    for mark in surface.find_marks(from, to) {
        let start = mark.from.max(covered);
        let end = mark.to.min(to);
        if start >= end {
            continue;
        }
        if start > covered {
            spans.push((start - covered, Meta::default()));
        }
        spans.push((end - start, mark.meta));
        covered = end;
    }
    if covered < to {
        spans.push((to - covered, Meta::default()));
    }
    spans
}

/// Character count of newline-split lines once joined back together
pub(crate) fn joined_len(lines: &[String]) -> usize {
    if lines.is_empty() {
        return 0;
    }
    lines.iter().map(|line| line.chars().count()).sum::<usize>() + lines.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pos_ordering() {
        assert!(Pos::new(0, 9) < Pos::new(1, 0));
        assert!(Pos::new(2, 1) < Pos::new(2, 3));
    }

    #[test]
    fn test_joined_len() {
        assert_eq!(joined_len(&[]), 0);
        assert_eq!(joined_len(&["".to_string()]), 0);
        assert_eq!(joined_len(&["ab".to_string(), "c".to_string()]), 4);
        assert_eq!(joined_len(&["".to_string(), "".to_string()]), 1);
    }
}
