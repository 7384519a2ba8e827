//! EditorAdapter: the application-facing binding
//!
//! Owns the surface, the undo history and the remote selection
//! renderings. Every entry point is synchronous; the host calls them from
//! its event loop, one at a time.

use super::apply::{annotate_inserts, apply_operation, snapshot};
use super::changes::operation_from_changes;
use super::remote::{validate_color, RemoteRendering};
use super::surface::{RawChange, Surface};
use super::toggle::{self, ToggleOutcome};
use crate::config::EditorConfig;
use crate::error::Result;
use crate::ot::{Meta, Op, Operation, Range, Selection, Style};
use crate::undo::UndoManager;
use std::collections::HashMap;

pub struct EditorAdapter<S: Surface> {
    surface: S,
    config: EditorConfig,
    undo: UndoManager,
    remote: HashMap<String, RemoteRendering>,
}

impl<S: Surface> EditorAdapter<S> {
    pub fn new(surface: S, config: EditorConfig) -> Self {
        let undo = UndoManager::new(config.undo_limit);
        Self {
            surface,
            config,
            undo,
            remote: HashMap::new(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Direct access for host-driven edits. Edits made here must be
    /// reported back through [`EditorAdapter::produce_local_operation`].
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn undo_manager(&self) -> &UndoManager {
        &self.undo
    }

    pub fn value(&self) -> String {
        self.surface.value()
    }

    /// Turn a change batch the surface already applied into
    /// `(operation, inverse)` and record the inverse for undo.
    ///
    /// Inserted text is attributed to the configured user, both in the
    /// returned operation and on the surface.
    pub fn produce_local_operation(&mut self, changes: &[RawChange]) -> Result<(Operation, Operation)> {
        let (operation, inverse) = operation_from_changes(changes, &self.surface)?;
        if operation.is_noop() {
            return Ok((operation, inverse));
        }

        let operation = self.attribute_inserts(operation);
        annotate_inserts(&mut self.surface, &operation);

        let compose = self.config.group_undo
            && self
                .undo
                .peek_undo()
                .is_some_and(|top| inverse.should_be_composed_with_inverted(top));
        self.undo.add(inverse.clone(), compose)?;
        Ok((operation, inverse))
    }

    fn attribute_inserts(&self, operation: Operation) -> Operation {
        if self.config.user_id == 0 {
            return operation;
        }
        let author = Meta::authored(self.config.user_id);
        operation
            .ops()
            .iter()
            .cloned()
            .map(|op| match op {
                Op::Insert { text, meta } => Op::insert(text, meta.merge(&author)),
                other => other,
            })
            .collect()
    }

    /// Apply an operation from the sequencing authority and rebase the
    /// undo history over it
    pub fn apply_remote_operation(&mut self, operation: &Operation) -> Result<()> {
        apply_operation(&mut self.surface, operation)?;
        self.undo.transform(operation)
    }

    /// Revert the most recent local edit. Returns the operation that was
    /// applied so it can be sent on, or `None` when there is nothing to
    /// undo.
    pub fn undo(&mut self) -> Result<Option<Operation>> {
        let Some(operation) = self.undo.take_undo() else {
            return Ok(None);
        };
        let redo = operation.invert_against(&snapshot(&self.surface))?;
        apply_operation(&mut self.surface, &operation)?;
        self.undo.record_undone(redo);
        Ok(Some(operation))
    }

    pub fn redo(&mut self) -> Result<Option<Operation>> {
        let Some(operation) = self.undo.take_redo() else {
            return Ok(None);
        };
        let undo = operation.invert_against(&snapshot(&self.surface))?;
        apply_operation(&mut self.surface, &operation)?;
        self.undo.record_redone(undo);
        Ok(Some(operation))
    }

    /// Flip `style` over `range` on the spans this user may change.
    ///
    /// The delta is applied locally (and recorded for undo) whenever it
    /// re-tags anything; send `outcome.delta` on in that case.
    pub fn toggle_meta(&mut self, range: Range, style: Style) -> Result<ToggleOutcome> {
        let outcome = toggle::toggle_meta(
            &self.surface,
            range,
            style,
            self.config.can_override,
            self.config.user_id,
        );
        if outcome.toggled > 0 {
            let inverse = outcome.delta.invert_against(&snapshot(&self.surface))?;
            apply_operation(&mut self.surface, &outcome.delta)?;
            self.undo.add(inverse, false)?;
        }
        Ok(outcome)
    }

    /// Draw a remote client's selection, replacing its previous one
    pub fn set_remote_selection(&mut self, client_id: &str, selection: &Selection, color: &str) -> Result<()> {
        validate_color(color)?;
        self.clear_remote_selection(client_id);
        let rendering = RemoteRendering::render(&mut self.surface, client_id, selection, color)?;
        self.remote.insert(client_id.to_string(), rendering);
        Ok(())
    }

    /// Remove a remote client's selection; false if none was drawn
    pub fn clear_remote_selection(&mut self, client_id: &str) -> bool {
        match self.remote.remove(client_id) {
            Some(rendering) => {
                rendering.dispose(&mut self.surface);
                true
            }
            None => false,
        }
    }

    pub fn selection(&self) -> Selection {
        self.surface.selection()
    }

    pub fn set_selection(&mut self, selection: &Selection) {
        self.surface.set_selection(selection);
    }

    /// The document with its annotations as an insert-only operation
    pub fn snapshot(&self) -> Operation {
        snapshot(&self.surface)
    }

    /// Replace the document with plain text, dropping history and remote
    /// renderings
    pub fn reset(&mut self, text: &str) {
        for (_, rendering) in self.remote.drain() {
            rendering.dispose(&mut self.surface);
        }
        self.surface.set_value(text);
        self.undo.clear();
    }

    /// Replace the document with a rich snapshot (an insert-only operation)
    pub fn load(&mut self, document: &Operation) -> Result<()> {
        self.reset("");
        apply_operation(&mut self.surface, document)
    }
}

#[cfg(all(test, feature = "memory-surface"))]
mod tests {
    use super::*;
    use crate::binding::memory::MemorySurface;
    use crate::error::OtError;

    fn adapter(text: &str, user_id: u32) -> EditorAdapter<MemorySurface> {
        EditorAdapter::new(MemorySurface::new(text), EditorConfig::for_user(user_id))
    }

    fn type_text(adapter: &mut EditorAdapter<MemorySurface>, at: usize, text: &str) -> Operation {
        let change = adapter.surface_mut().edit(at, at, text, Some("+input"));
        adapter.produce_local_operation(&[change]).unwrap().0
    }

    #[test]
    fn test_local_insert_is_attributed() {
        let mut editor = adapter("", 1);
        let op = type_text(&mut editor, 0, "hi");
        assert_eq!(op.ops(), &[Op::insert("hi", Meta::authored(1))]);
        assert_eq!(editor.surface().meta_at(0), Some(Meta::authored(1)));
    }

    #[test]
    fn test_anonymous_insert_is_plain() {
        let mut editor = adapter("", 0);
        let op = type_text(&mut editor, 0, "hi");
        assert_eq!(op.ops(), &[Op::insert("hi", Meta::default())]);
        assert!(editor.surface().marks().is_empty());
    }

    #[test]
    fn test_undo_redo() {
        let mut editor = adapter("", 1);
        type_text(&mut editor, 0, "hi");

        let undo = editor.undo().unwrap().unwrap();
        assert_eq!(undo.ops(), &[Op::delete(2)]);
        assert_eq!(editor.value(), "");

        let redo = editor.redo().unwrap().unwrap();
        assert_eq!(redo.ops(), &[Op::insert("hi", Meta::authored(1))]);
        assert_eq!(editor.value(), "hi");
        assert_eq!(editor.surface().meta_at(1), Some(Meta::authored(1)));

        assert!(editor.redo().unwrap().is_none());
    }

    #[test]
    fn test_typing_groups_into_one_undo() {
        let mut editor = adapter("", 0);
        type_text(&mut editor, 0, "a");
        type_text(&mut editor, 1, "b");
        type_text(&mut editor, 2, "c");
        assert_eq!(editor.undo_manager().undo_len(), 1);
        editor.undo().unwrap();
        assert_eq!(editor.value(), "");
    }

    #[test]
    fn test_grouping_disabled() {
        let config = EditorConfig {
            group_undo: false,
            ..EditorConfig::default()
        };
        let mut editor = EditorAdapter::new(MemorySurface::new(""), config);
        type_text(&mut editor, 0, "a");
        type_text(&mut editor, 1, "b");
        assert_eq!(editor.undo_manager().undo_len(), 2);
    }

    #[test]
    fn test_undo_after_remote_edit() {
        let mut editor = adapter("ab", 0);
        type_text(&mut editor, 0, "x");

        let mut remote = Operation::new();
        remote.retain(3).insert("!");
        editor.apply_remote_operation(&remote).unwrap();
        assert_eq!(editor.value(), "xab!");

        editor.undo().unwrap();
        assert_eq!(editor.value(), "ab!");
    }

    #[test]
    fn test_remote_operation_length_mismatch() {
        let mut editor = adapter("abc", 0);
        let err = editor
            .apply_remote_operation(&Operation::identity(10))
            .unwrap_err();
        assert!(err.requires_resync());
    }

    #[test]
    fn test_toggle_and_undo() {
        let mut editor = adapter("abc", 1);
        editor.surface_mut().mark_text(0, 3, Meta::authored(1));

        let outcome = editor.toggle_meta(Range::new(0, 3), Style::Bold).unwrap();
        assert!(outcome.allowed);
        assert!(editor.surface().meta_at(1).unwrap().is_on(Style::Bold));

        editor.undo().unwrap();
        let meta = editor.surface().meta_at(1).unwrap();
        assert!(!meta.is_on(Style::Bold));
        assert_eq!(meta.user_id, Some(1));
    }

    #[test]
    fn test_toggle_denied_changes_nothing() {
        let mut editor = adapter("abc", 1);
        editor.surface_mut().mark_text(0, 3, Meta::authored(2));
        let outcome = editor.toggle_meta(Range::new(0, 3), Style::Bold).unwrap();
        assert!(!outcome.allowed);
        assert_eq!(outcome.toggled, 0);
        assert!(!editor.undo_manager().can_undo());
    }

    #[test]
    fn test_remote_selection_rerender() {
        let mut editor = adapter("hello", 0);
        editor
            .set_remote_selection("peer", &Selection::cursor(1), "#aabbcc")
            .unwrap();
        editor
            .set_remote_selection("peer", &Selection::new(vec![Range::new(0, 2)]), "#aabbcc")
            .unwrap();
        assert_eq!(editor.surface().markers().len(), 1);

        let err = editor
            .set_remote_selection("peer", &Selection::cursor(0), "blue")
            .unwrap_err();
        assert_eq!(err, OtError::InvalidColor("blue".to_string()));
        assert_eq!(editor.surface().markers().len(), 1);

        assert!(editor.clear_remote_selection("peer"));
        assert!(editor.surface().markers().is_empty());
        assert!(!editor.clear_remote_selection("peer"));
    }

    #[test]
    fn test_load_snapshot() {
        let mut editor = adapter("old", 0);
        let mut document = Operation::new();
        document
            .insert("new ")
            .insert_with("text", Meta::styled(Style::Italic, true));
        editor.load(&document).unwrap();
        assert_eq!(editor.value(), "new text");
        assert_eq!(editor.snapshot(), document);
    }
}
