//! Change batch → Operation replay
//!
//! A surface reports a batch of line/column changes, each addressed in
//! the coordinates that existed right before it. Only the final
//! coordinate system can be converted to indices directly (the surface
//! already holds the post-edit text), so the batch is replayed from the
//! most recent change backwards: every processed change adds a layer to
//! the position→index mapping that translates a position one step
//! further back in time.
//!
//! The cost is quadratic in the batch size. Batches come from a single
//! keystroke or paste, so they stay small.

use super::surface::{joined_len, Pos, RawChange, Surface};
use crate::error::{OtError, Result};
use crate::ot::Operation;

/// Build `(operation, inverse)` for a change batch.
///
/// `surface` must already reflect every change in the batch. Changes
/// without an origin were made programmatically and are skipped.
pub fn operation_from_changes<S: Surface + ?Sized>(
    changes: &[RawChange],
    surface: &S,
) -> Result<(Operation, Operation)> {
    let user_changes: Vec<&RawChange> = changes
        .iter()
        .filter(|change| {
            log::debug!("change with origin {:?}", change.origin);
            change.is_user_change()
        })
        .collect();

    let mut doc_end = surface.len_chars();
    let mut operation = Operation::identity(doc_end);
    let mut inverse = Operation::identity(doc_end);
    let mut layers: Vec<&RawChange> = Vec::with_capacity(user_changes.len());

    for change in user_changes.into_iter().rev() {
        layers.push(change);
        let from_index = layered_index(surface, &layers, change.from);
        let removed_len = joined_len(&change.removed);
        let text_len = joined_len(&change.text);
        let rest = doc_end
            .checked_sub(from_index + text_len)
            .ok_or(OtError::OutOfBounds {
                index: from_index + text_len,
                length: doc_end,
            })?;

        let mut step = Operation::new();
        step.retain(from_index)
            .delete(removed_len)
            .insert(&change.text.join("\n"))
            .retain(rest);
        operation = step.compose(&operation)?;

        let mut undo_step = Operation::new();
        undo_step
            .retain(from_index)
            .delete(text_len)
            .insert(&change.removed.join("\n"))
            .retain(rest);
        inverse = inverse.compose(&undo_step)?;

        doc_end = doc_end + removed_len - text_len;
    }

    Ok((operation, inverse))
}

/// Index of `pos` in the coordinate system before the outermost layer
fn layered_index<S: Surface + ?Sized>(surface: &S, layers: &[&RawChange], pos: Pos) -> usize {
    let Some((change, inner)) = layers.split_last() else {
        return surface.index_from_pos(pos);
    };

    if pos <= change.from {
        return layered_index(surface, inner, pos);
    }

    let text_len = joined_len(&change.text) as isize;
    let removed_len = joined_len(&change.removed) as isize;

    if change.to <= pos {
        // the position sits after the change: shift it into the
        // post-change coordinates and look it up there
        let text_lines = change.text.len().max(1);
        let line = pos.line - (change.to.line - change.from.line) + text_lines - 1;
        let ch = if change.to.line < pos.line {
            pos.ch as isize
        } else if text_lines <= 1 {
            pos.ch as isize - (change.to.ch as isize - change.from.ch as isize) + text_len
        } else {
            let last = change.text.last().map_or(0, |text| text.chars().count());
            pos.ch as isize - change.to.ch as isize + last as isize
        };
        let shifted = Pos::new(line, ch.max(0) as usize);
        let index = layered_index(surface, inner, shifted) as isize + removed_len - text_len;
        return index.max(0) as usize;
    }

    // inside the replaced range: count through the removed text
    let from_index = layered_index(surface, inner, change.from);
    if pos.line == change.from.line {
        return from_index + pos.ch - change.from.ch;
    }
    let lines = (pos.line - change.from.line).min(change.removed.len());
    from_index + joined_len(&change.removed[..lines]) + 1 + pos.ch
}
