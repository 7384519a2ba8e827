//! Undo/redo history of inverse operations
//!
//! Each local edit records its inverse. Consecutive edits that belong
//! together (contiguous typing, repeated backspace) are composed into a
//! single entry. Remote operations rebase both stacks so that undo only
//! ever reverts the local user's own changes.

use crate::error::Result;
use crate::ot::Operation;
use std::collections::VecDeque;

/// Default number of undo entries kept
pub const DEFAULT_UNDO_LIMIT: usize = 50;

/// Bounded undo and redo stacks
#[derive(Debug, Clone)]
pub struct UndoManager {
    /// Inverses of applied edits (most recent last)
    undo_stack: VecDeque<Operation>,
    /// Inverses of undone edits (most recent last)
    redo_stack: VecDeque<Operation>,
    /// Maximum entries per stack (0 = unlimited)
    max_items: usize,
    /// Set after undo/redo so the next edit starts a fresh entry
    dont_compose: bool,
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_LIMIT)
    }
}

impl UndoManager {
    pub fn new(max_items: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_items,
            dont_compose: false,
        }
    }

    /// Record the inverse of a local edit.
    ///
    /// With `compose` set, the inverse is folded into the most recent entry
    /// unless an undo or redo happened since. Any new edit clears the redo
    /// history.
    pub fn add(&mut self, inverse: Operation, compose: bool) -> Result<()> {
        let composed = match self.undo_stack.back() {
            Some(top) if compose && !self.dont_compose => Some(inverse.compose(top)?),
            _ => None,
        };
        match composed {
            Some(entry) => {
                self.undo_stack.pop_back();
                self.undo_stack.push_back(entry);
            }
            None => Self::push_bounded(&mut self.undo_stack, inverse, self.max_items),
        }
        self.dont_compose = false;
        self.redo_stack.clear();
        Ok(())
    }

    /// The most recent entry, left in place (used to decide grouping)
    pub fn peek_undo(&self) -> Option<&Operation> {
        self.undo_stack.back()
    }

    /// Pop the operation that reverts the most recent edit
    pub fn take_undo(&mut self) -> Option<Operation> {
        self.undo_stack.pop_back()
    }

    pub fn take_redo(&mut self) -> Option<Operation> {
        self.redo_stack.pop_back()
    }

    /// Record the inverse of an applied undo so it can be redone
    pub fn record_undone(&mut self, inverse: Operation) {
        Self::push_bounded(&mut self.redo_stack, inverse, self.max_items);
        self.dont_compose = true;
    }

    /// Record the inverse of an applied redo so it can be undone again
    pub fn record_redone(&mut self, inverse: Operation) {
        Self::push_bounded(&mut self.undo_stack, inverse, self.max_items);
        self.dont_compose = true;
    }

    /// Rebase both stacks over an operation applied by someone else
    pub fn transform(&mut self, remote: &Operation) -> Result<()> {
        self.undo_stack = Self::transform_stack(&self.undo_stack, remote)?;
        self.redo_stack = Self::transform_stack(&self.redo_stack, remote)?;
        Ok(())
    }

    fn transform_stack(stack: &VecDeque<Operation>, remote: &Operation) -> Result<VecDeque<Operation>> {
        let mut rebased = VecDeque::with_capacity(stack.len());
        let mut op = remote.clone();
        for entry in stack.iter().rev() {
            let (entry_prime, op_prime) = Operation::transform(entry, &op)?;
            rebased.push_front(entry_prime);
            op = op_prime;
        }
        Ok(rebased)
    }

    fn push_bounded(stack: &mut VecDeque<Operation>, op: Operation, max_items: usize) {
        stack.push_back(op);
        if max_items > 0 {
            while stack.len() > max_items {
                stack.pop_front();
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.dont_compose = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(at: usize, text: &str, after: usize) -> Operation {
        let mut op = Operation::new();
        op.retain(at).insert(text).retain(after);
        op
    }

    #[test]
    fn test_add_and_take() {
        let mut undo = UndoManager::default();
        let edit = typed(0, "a", 0);
        undo.add(edit.invert("").unwrap(), false).unwrap();
        assert!(undo.can_undo());
        let inverse = undo.take_undo().unwrap();
        assert_eq!(inverse.apply("a").unwrap(), "");
        assert!(!undo.can_undo());
    }

    #[test]
    fn test_compose_groups_entries() {
        let mut undo = UndoManager::default();
        let first = typed(0, "a", 0);
        let second = typed(1, "b", 0);
        undo.add(first.invert("").unwrap(), true).unwrap();
        undo.add(second.invert("a").unwrap(), true).unwrap();
        assert_eq!(undo.undo_len(), 1);
        assert_eq!(undo.take_undo().unwrap().apply("ab").unwrap(), "");
    }

    #[test]
    fn test_no_compose_after_undo() {
        let mut undo = UndoManager::default();
        undo.add(typed(0, "a", 0).invert("").unwrap(), false).unwrap();
        undo.add(typed(1, "b", 0).invert("a").unwrap(), false).unwrap();
        let inverse = undo.take_undo().unwrap();
        undo.record_undone(inverse.invert("ab").unwrap());
        assert!(undo.can_redo());

        undo.add(typed(1, "c", 0).invert("a").unwrap(), true).unwrap();
        assert_eq!(undo.undo_len(), 2);
        assert!(!undo.can_redo());
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut undo = UndoManager::new(2);
        let mut doc = String::new();
        for ch in ["a", "b", "c"] {
            let edit = typed(doc.chars().count(), ch, 0);
            undo.add(edit.invert(&doc).unwrap(), false).unwrap();
            doc = edit.apply(&doc).unwrap();
        }
        assert_eq!(undo.undo_len(), 2);
        assert_eq!(undo.take_undo().unwrap().apply("abc").unwrap(), "ab");
        assert_eq!(undo.take_undo().unwrap().apply("ab").unwrap(), "a");
    }

    #[test]
    fn test_transform_rebases_over_remote() {
        let mut undo = UndoManager::default();
        // local typed "x" at 0 of "ab"
        let local = typed(0, "x", 2);
        undo.add(local.invert("ab").unwrap(), false).unwrap();

        // remote appends "!" to "xab"
        let remote = typed(3, "!", 0);
        undo.transform(&remote).unwrap();

        let inverse = undo.take_undo().unwrap();
        assert_eq!(inverse.apply("xab!").unwrap(), "ab!");
    }
}
