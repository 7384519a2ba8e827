//! Operation → surface
//!
//! Text ops are replayed with a running index. Inserts and retains that
//! carry metadata are reconciled against the annotations already on the
//! surface: overlapping annotations are split at the op boundaries and
//! the overlap re-tagged.

use super::surface::{annotated_spans, Surface};
use crate::error::{OtError, Result};
use crate::ot::{Meta, Op, Operation};

/// How an op's metadata combines with an annotation it overlaps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overlay {
    /// Inserted text takes the op's metadata as-is
    Replace,
    /// Retained text keeps what the op does not specify
    Merge,
}

/// Apply `operation` to the surface.
///
/// Fails with [`OtError::OutOfBounds`] when the operation was built for a
/// document of a different length; the surface is left untouched.
pub fn apply_operation<S: Surface + ?Sized>(surface: &mut S, operation: &Operation) -> Result<()> {
    let length = surface.len_chars();
    if operation.base_length() != length {
        return Err(OtError::OutOfBounds {
            index: operation.base_length(),
            length,
        });
    }
    log::trace!("applying {:?}", operation.ops());

    let mut index = 0;
    for op in operation.ops() {
        match op {
            Op::Insert { text, meta } => {
                let at = surface.pos_from_index(index);
                surface.replace_range(text, at, at);
                let len = text.chars().count();
                if !meta.is_empty() {
                    annotate(surface, index, index + len, meta, Overlay::Replace);
                }
                index += len;
            }
            Op::Retain { len, meta } => {
                if !meta.is_empty() {
                    annotate(surface, index, index + len, meta, Overlay::Merge);
                }
                index += len;
            }
            Op::Delete { len } => {
                let from = surface.pos_from_index(index);
                let to = surface.pos_from_index(index + len);
                surface.replace_range("", from, to);
            }
        }
    }
    Ok(())
}

/// Tag the inserted spans of an already-applied operation with their
/// metadata. Used after a local edit, when the text is on the surface
/// but annotations are not.
pub(crate) fn annotate_inserts<S: Surface + ?Sized>(surface: &mut S, operation: &Operation) {
    let mut index = 0;
    for op in operation.ops() {
        match op {
            Op::Insert { text, meta } => {
                let len = text.chars().count();
                if !meta.is_empty() {
                    annotate(surface, index, index + len, meta, Overlay::Replace);
                }
                index += len;
            }
            Op::Retain { len, .. } => index += len,
            Op::Delete { .. } => {}
        }
    }
}

fn annotate<S: Surface + ?Sized>(surface: &mut S, from: usize, to: usize, meta: &Meta, overlay: Overlay) {
    let mut covered = from;
    for mark in surface.find_marks(from, to) {
        let start = mark.from.max(from);
        let end = mark.to.min(to);
        if start > covered {
            surface.mark_text(covered, start, *meta);
        }
        covered = covered.max(end);

        let merged = match overlay {
            Overlay::Replace => *meta,
            Overlay::Merge => mark.meta.merge(meta),
        };
        if merged == mark.meta {
            continue;
        }
        surface.clear_mark(mark.id);
        if mark.from < from {
            surface.mark_text(mark.from, from, mark.meta);
        }
        if mark.to > to {
            surface.mark_text(to, mark.to, mark.meta);
        }
        surface.mark_text(start, end, merged);
    }
    if covered < to {
        surface.mark_text(covered, to, *meta);
    }
}

/// The whole document with its annotations, as an insert-only operation
pub fn snapshot<S: Surface + ?Sized>(surface: &S) -> Operation {
    let text = surface.value();
    let mut chars = text.chars();
    let mut snapshot = Operation::new();
    for (len, meta) in annotated_spans(surface, 0, surface.len_chars()) {
        let span: String = chars.by_ref().take(len).collect();
        snapshot.insert_with(&span, meta);
    }
    snapshot
}

#[cfg(all(test, feature = "memory-surface"))]
mod tests {
    use super::*;
    use crate::binding::memory::MemorySurface;
    use crate::ot::Style;

    #[test]
    fn test_apply_text() {
        let mut surface = MemorySurface::new("hello\nworld");
        let mut op = Operation::new();
        op.retain(5).delete(1).insert(", ").retain(5).insert("!");
        apply_operation(&mut surface, &op).unwrap();
        assert_eq!(surface.value(), "hello, world!");
    }

    #[test]
    fn test_length_mismatch_is_out_of_bounds() {
        let mut surface = MemorySurface::new("abc");
        let op = Operation::identity(5);
        let err = apply_operation(&mut surface, &op).unwrap_err();
        assert_eq!(err, OtError::OutOfBounds { index: 5, length: 3 });
        assert!(err.requires_resync());
        assert_eq!(surface.value(), "abc");
    }

    #[test]
    fn test_retain_meta_creates_mark() {
        let mut surface = MemorySurface::new("abcdef");
        let bold = Meta::styled(Style::Bold, true);
        let mut op = Operation::new();
        op.retain(1).retain_with(3, bold).retain(2);
        apply_operation(&mut surface, &op).unwrap();
        let marks = surface.marks();
        assert_eq!(marks.len(), 1);
        assert_eq!((marks[0].from, marks[0].to, marks[0].meta), (1, 4, bold));
    }

    #[test]
    fn test_retain_meta_splits_existing_mark() {
        let mut surface = MemorySurface::new("abcdef");
        let author = Meta::authored(7);
        surface.mark_text(0, 6, author);

        let mut op = Operation::new();
        op.retain(2)
            .retain_with(2, Meta::styled(Style::Italic, true))
            .retain(2);
        apply_operation(&mut surface, &op).unwrap();

        let spans: Vec<_> = surface
            .marks()
            .iter()
            .map(|mark| (mark.from, mark.to, mark.meta))
            .collect();
        assert_eq!(
            spans,
            vec![
                (0, 2, author),
                (2, 4, author.with_style(Style::Italic, true)),
                (4, 6, author),
            ]
        );
    }

    #[test]
    fn test_insert_meta_replaces_inside_mark() {
        let mut surface = MemorySurface::new("abcd");
        let bold = Meta::styled(Style::Bold, true).with_user(1);
        surface.mark_text(0, 4, bold);

        let typed = Meta::authored(2);
        let mut op = Operation::new();
        op.retain(2).insert_with("XY", typed).retain(2);
        apply_operation(&mut surface, &op).unwrap();

        assert_eq!(surface.value(), "abXYcd");
        assert_eq!(surface.meta_at(1), Some(bold));
        assert_eq!(surface.meta_at(2), Some(typed));
        assert_eq!(surface.meta_at(3), Some(typed));
        assert_eq!(surface.meta_at(4), Some(bold));
    }

    #[test]
    fn test_unchanged_meta_keeps_mark() {
        let mut surface = MemorySurface::new("abc");
        let bold = Meta::styled(Style::Bold, true);
        let id = surface.mark_text(0, 3, bold);
        let mut op = Operation::new();
        op.retain_with(3, bold);
        apply_operation(&mut surface, &op).unwrap();
        assert_eq!(surface.marks()[0].id, id);
    }

    #[test]
    fn test_snapshot() {
        let mut surface = MemorySurface::new("abcdef");
        let bold = Meta::styled(Style::Bold, true);
        surface.mark_text(2, 4, bold);
        let snap = snapshot(&surface);
        assert_eq!(
            snap.ops(),
            &[
                Op::insert("ab", Meta::default()),
                Op::insert("cd", bold),
                Op::insert("ef", Meta::default()),
            ]
        );
        assert_eq!(snap.base_length(), 0);
        assert_eq!(snap.target_length(), 6);
    }
}
