//! Style toggling over a range, subject to authorship

use super::surface::{annotated_spans, Surface};
use crate::ot::{Meta, Operation, Range, Style, UserId};

/// Result of [`toggle_meta`]. Denial is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// The caller may override others' text, or owns all of the range
    pub allowed: bool,
    /// Retain-only delta over the whole document. Only spans the caller
    /// may change are tagged, so it is safe to apply even when
    /// `allowed` is false.
    pub delta: Operation,
    /// Characters the delta re-tags
    pub toggled: usize,
    /// Characters in the requested range
    pub requested: usize,
}

/// Build the delta that flips `style` over `range`.
///
/// The new value is off when every character in the range already has
/// the style on, and on otherwise. Text no annotation covers counts as
/// unformatted and unowned.
pub fn toggle_meta<S: Surface + ?Sized>(
    surface: &S,
    range: Range,
    style: Style,
    can_override: bool,
    user_id: UserId,
) -> ToggleOutcome {
    let doc_len = surface.len_chars();
    let from = range.from().min(doc_len);
    let to = range.to().min(doc_len);

    if from == to {
        return ToggleOutcome {
            allowed: true,
            delta: Operation::identity(doc_len),
            toggled: 0,
            requested: 0,
        };
    }

    let spans = annotated_spans(surface, from, to);
    let owns = |meta: &Meta| meta.user_id == Some(user_id);
    let all_on = spans.iter().all(|(_, meta)| meta.is_on(style));
    let all_own = spans.iter().all(|(_, meta)| owns(meta));
    let change = Meta::styled(style, !all_on);

    let mut delta = Operation::new();
    let mut toggled = 0;
    delta.retain(from);
    for (len, meta) in &spans {
        if can_override || owns(meta) {
            delta.retain_with(*len, change);
            toggled += len;
        } else {
            delta.retain(*len);
        }
    }
    delta.retain(doc_len - to);

    ToggleOutcome {
        allowed: can_override || all_own,
        delta,
        toggled,
        requested: to - from,
    }
}
