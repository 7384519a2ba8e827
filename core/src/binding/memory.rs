//! Rope-backed in-memory [`Surface`]
//!
//! Stands in for a real editor widget in headless hosts and tests.
//! Annotations do not grow when text is inserted exactly at one of their
//! boundaries; text inserted strictly inside one extends it.

use super::surface::{Mark, MarkId, MarkerId, Pos, RawChange, Surface};
use crate::ot::{Meta, Range, Selection};
use ropey::Rope;

/// What a remote marker draws
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Cursor,
    Selection,
}

/// A remote cursor or selection drawn on the surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub id: MarkerId,
    pub kind: MarkerKind,
    pub from: usize,
    pub to: usize,
    pub color: String,
    pub client_id: String,
}

#[derive(Debug, Clone)]
pub struct MemorySurface {
    rope: Rope,
    marks: Vec<Mark>,
    markers: Vec<Marker>,
    selection: Selection,
    next_id: u64,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new("")
    }
}

impl MemorySurface {
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            marks: Vec::new(),
            markers: Vec::new(),
            selection: Selection::cursor(0),
            next_id: 1,
        }
    }

    /// Simulate a user edit of `[from, to)` and return the change record
    /// the widget would report for it.
    pub fn edit(&mut self, from: usize, to: usize, text: &str, origin: Option<&str>) -> RawChange {
        let from = from.min(self.rope.len_chars());
        let to = to.clamp(from, self.rope.len_chars());
        let from_pos = self.pos_from_index(from);
        let to_pos = self.pos_from_index(to);
        let removed = self.rope.slice(from..to).to_string();

        self.replace_range(text, from_pos, to_pos);

        RawChange {
            from: from_pos,
            to: to_pos,
            removed: removed.split('\n').map(str::to_string).collect(),
            text: text.split('\n').map(str::to_string).collect(),
            origin: origin.map(str::to_string),
        }
    }

    /// All annotations, ordered by start
    pub fn marks(&self) -> Vec<Mark> {
        let mut marks = self.marks.clone();
        marks.sort_by_key(|mark| (mark.from, mark.to));
        marks
    }

    /// Metadata of the annotation covering `index`, if any
    pub fn meta_at(&self, index: usize) -> Option<Meta> {
        self.marks
            .iter()
            .find(|mark| mark.from <= index && index < mark.to)
            .map(|mark| mark.meta)
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn line_len(&self, line: usize) -> usize {
        let slice = self.rope.line(line);
        let len = slice.len_chars();
        if len > 0 && slice.char(len - 1) == '\n' {
            len - 1
        } else {
            len
        }
    }

    fn shift_for_delete(&mut self, from: usize, to: usize) {
        let removed = to - from;
        let map = |index: usize| {
            if index <= from {
                index
            } else if index >= to {
                index - removed
            } else {
                from
            }
        };
        for mark in &mut self.marks {
            mark.from = map(mark.from);
            mark.to = map(mark.to);
        }
        self.marks.retain(|mark| mark.from < mark.to);

        for marker in &mut self.markers {
            marker.from = map(marker.from);
            marker.to = map(marker.to);
        }
        self.markers
            .retain(|marker| marker.kind == MarkerKind::Cursor || marker.from < marker.to);

        self.selection = Selection::new(
            self.selection
                .ranges
                .iter()
                .map(|range| Range::new(map(range.anchor), map(range.head)))
                .collect(),
        );
    }

    fn shift_for_insert(&mut self, at: usize, len: usize) {
        for mark in &mut self.marks {
            if mark.from >= at {
                mark.from += len;
            }
            if mark.to > at {
                mark.to += len;
            }
        }
        for marker in &mut self.markers {
            match marker.kind {
                MarkerKind::Cursor if marker.from >= at => {
                    marker.from += len;
                    marker.to += len;
                }
                MarkerKind::Cursor => {}
                MarkerKind::Selection => {
                    if marker.from >= at {
                        marker.from += len;
                    }
                    if marker.to > at {
                        marker.to += len;
                    }
                }
            }
        }
        let shift = |index: usize| if index >= at { index + len } else { index };
        self.selection = Selection::new(
            self.selection
                .ranges
                .iter()
                .map(|range| Range::new(shift(range.anchor), shift(range.head)))
                .collect(),
        );
    }
}

impl Surface for MemorySurface {
    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn value(&self) -> String {
        self.rope.to_string()
    }

    fn set_value(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.marks.clear();
        self.markers.clear();
        self.selection = Selection::cursor(0);
    }

    fn index_from_pos(&self, pos: Pos) -> usize {
        let line = pos.line.min(self.rope.len_lines().saturating_sub(1));
        self.rope.line_to_char(line) + pos.ch.min(self.line_len(line))
    }

    fn pos_from_index(&self, index: usize) -> Pos {
        let index = index.min(self.rope.len_chars());
        let line = self.rope.char_to_line(index);
        Pos::new(line, index - self.rope.line_to_char(line))
    }

    fn replace_range(&mut self, text: &str, from: Pos, to: Pos) {
        let (from, to) = (from.min(to), from.max(to));
        let start = self.index_from_pos(from);
        let end = self.index_from_pos(to);
        if end > start {
            self.rope.remove(start..end);
            self.shift_for_delete(start, end);
        }
        if !text.is_empty() {
            self.rope.insert(start, text);
            self.shift_for_insert(start, text.chars().count());
        }
    }

    fn find_marks(&self, from: usize, to: usize) -> Vec<Mark> {
        let mut found: Vec<Mark> = self
            .marks
            .iter()
            .filter(|mark| mark.from < to && mark.to > from)
            .copied()
            .collect();
        found.sort_by_key(|mark| (mark.from, mark.to));
        found
    }

    fn mark_text(&mut self, from: usize, to: usize, meta: Meta) -> MarkId {
        let id = self.next_id();
        if from < to {
            self.marks.push(Mark { id, from, to, meta });
        }
        id
    }

    fn clear_mark(&mut self, id: MarkId) {
        self.marks.retain(|mark| mark.id != id);
    }

    fn selection(&self) -> Selection {
        self.selection.clone()
    }

    fn set_selection(&mut self, selection: &Selection) {
        self.selection = selection.clone();
    }

    fn add_cursor_marker(&mut self, index: usize, color: &str, client_id: &str) -> MarkerId {
        let id = self.next_id();
        self.markers.push(Marker {
            id,
            kind: MarkerKind::Cursor,
            from: index,
            to: index,
            color: color.to_string(),
            client_id: client_id.to_string(),
        });
        id
    }

    fn add_selection_marker(&mut self, from: usize, to: usize, color: &str, client_id: &str) -> MarkerId {
        let id = self.next_id();
        self.markers.push(Marker {
            id,
            kind: MarkerKind::Selection,
            from,
            to,
            color: color.to_string(),
            client_id: client_id.to_string(),
        });
        id
    }

    fn clear_marker(&mut self, id: MarkerId) {
        self.markers.retain(|marker| marker.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ot::Style;

    #[test]
    fn test_positions() {
        let surface = MemorySurface::new("ab\ncde\n");
        assert_eq!(surface.index_from_pos(Pos::new(1, 2)), 5);
        assert_eq!(surface.pos_from_index(5), Pos::new(1, 2));
        assert_eq!(surface.pos_from_index(7), Pos::new(2, 0));
        // columns past the line end clip to it
        assert_eq!(surface.index_from_pos(Pos::new(0, 10)), 2);
        assert_eq!(surface.index_from_pos(Pos::new(9, 0)), 7);
    }

    #[test]
    fn test_edit_reports_change() {
        let mut surface = MemorySurface::new("one\ntwo");
        let change = surface.edit(2, 5, "X", Some("+input"));
        assert_eq!(surface.value(), "onXwo");
        assert_eq!(change.from, Pos::new(0, 2));
        assert_eq!(change.to, Pos::new(1, 1));
        assert_eq!(change.removed, vec!["e".to_string(), "t".to_string()]);
        assert_eq!(change.text, vec!["X".to_string()]);
    }

    #[test]
    fn test_marks_follow_edits() {
        let mut surface = MemorySurface::new("abcdef");
        let bold = Meta::styled(Style::Bold, true);
        surface.mark_text(1, 4, bold);

        // at the boundary: no growth
        surface.edit(4, 4, "X", Some("+input"));
        assert_eq!(surface.marks()[0].to, 4);
        surface.edit(1, 1, "Y", Some("+input"));
        assert_eq!((surface.marks()[0].from, surface.marks()[0].to), (2, 5));

        // inside: grows
        surface.edit(3, 3, "Z", Some("+input"));
        assert_eq!((surface.marks()[0].from, surface.marks()[0].to), (2, 6));

        // deleting the whole span removes it
        surface.edit(1, 7, "", Some("+delete"));
        assert!(surface.marks().is_empty());
    }

    #[test]
    fn test_markers_shift() {
        let mut surface = MemorySurface::new("hello");
        surface.add_cursor_marker(2, "#ff0000", "peer");
        surface.edit(0, 0, "ab", None);
        assert_eq!(surface.markers()[0].from, 4);
        surface.edit(0, 5, "", None);
        assert_eq!(surface.markers()[0].from, 0);
    }

    #[test]
    fn test_set_value_resets() {
        let mut surface = MemorySurface::new("abc");
        surface.mark_text(0, 3, Meta::authored(1));
        surface.set_value("xyz");
        assert_eq!(surface.value(), "xyz");
        assert!(surface.marks().is_empty());
    }
}
