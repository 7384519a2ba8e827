//! Operation: a canonical sequence of ops transforming one document
//! revision into the next
//!
//! When an operation is applied to a document, think of an imaginary
//! cursor running over the text: Retain skips (optionally re-tagging the
//! span), Insert splices new text in, Delete removes text ahead of it.
//!
//! # Canonical form
//!
//! The builder methods keep every operation canonical so that two
//! operations with the same effect compare equal op-by-op:
//!
//! - zero-length ops are never stored;
//! - adjacent ops of the same kind and metadata are merged;
//! - an Insert adjacent to a Delete always comes first.
//!
//! # Example
//!
//! ```rust
//! use coedit_core::ot::Operation;
//!
//! // "abc" -> "bc"
//! let mut a = Operation::new();
//! a.delete(1).retain(2);
//! // "abc" -> "abcx"
//! let mut b = Operation::new();
//! b.retain(3).insert("x");
//!
//! let (a_prime, b_prime) = Operation::transform(&a, &b).unwrap();
//! let left = b_prime.apply(&a.apply("abc").unwrap()).unwrap();
//! let right = a_prime.apply(&b.apply("abc").unwrap()).unwrap();
//! assert_eq!(left, "bcx");
//! assert_eq!(left, right);
//! ```

use super::meta::Meta;
use super::op::{slice_chars, Op};
use crate::error::{OtError, Result};
use serde::{Deserialize, Serialize};

/// An ordered, canonical sequence of [`Op`]s
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    ops: Vec<Op>,

    /// Length of every document this operation applies to
    base_length: usize,

    /// Length of the document it produces
    target_length: usize,
}

/// Where the next insert lands relative to the tail of the op list
enum InsertSlot {
    Extend(usize),
    Before(usize),
    Push,
}

impl Operation {
    pub fn new() -> Self {
        Self::default()
    }

    /// The operation that leaves a document of `len` characters untouched
    pub fn identity(len: usize) -> Self {
        let mut op = Self::new();
        op.retain(len);
        op
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn base_length(&self) -> usize {
        self.base_length
    }

    pub fn target_length(&self) -> usize {
        self.target_length
    }

    /// Whether applying this operation changes nothing: the op list is
    /// empty or holds only metadata-free retains.
    pub fn is_noop(&self) -> bool {
        self.ops
            .iter()
            .all(|op| matches!(op, Op::Retain { meta, .. } if meta.is_empty()))
    }

    /// Skip `n` characters
    pub fn retain(&mut self, n: usize) -> &mut Self {
        self.retain_with(n, Meta::default())
    }

    /// Skip `n` characters, tagging them with `meta`
    pub fn retain_with(&mut self, n: usize, meta: Meta) -> &mut Self {
        if n == 0 {
            return self;
        }
        self.base_length += n;
        self.target_length += n;
        if let Some(Op::Retain { len, meta: last }) = self.ops.last_mut() {
            if *last == meta {
                *len += n;
                return self;
            }
        }
        self.ops.push(Op::retain(n, meta));
        self
    }

    /// Insert `text` at the current position
    pub fn insert(&mut self, text: &str) -> &mut Self {
        self.insert_with(text, Meta::default())
    }

    /// Insert `text` tagged with `meta`
    pub fn insert_with(&mut self, text: &str, meta: Meta) -> &mut Self {
        if text.is_empty() {
            return self;
        }
        self.target_length += text.chars().count();

        let n = self.ops.len();
        let slot = match self.ops.as_slice() {
            [.., Op::Insert { meta: last, .. }] if *last == meta => InsertSlot::Extend(n - 1),
            [.., Op::Insert { meta: last, .. }, Op::Delete { .. }] if *last == meta => {
                InsertSlot::Extend(n - 2)
            }
            // insert-then-delete is the canonical order of an adjacent pair
            [.., Op::Delete { .. }] => InsertSlot::Before(n - 1),
            _ => InsertSlot::Push,
        };

        match slot {
            InsertSlot::Extend(at) => {
                if let Some(Op::Insert { text: existing, .. }) = self.ops.get_mut(at) {
                    existing.push_str(text);
                }
            }
            InsertSlot::Before(at) => self.ops.insert(at, Op::insert(text, meta)),
            InsertSlot::Push => self.ops.push(Op::insert(text, meta)),
        }
        self
    }

    /// Delete the next `n` characters
    pub fn delete(&mut self, n: usize) -> &mut Self {
        if n == 0 {
            return self;
        }
        self.base_length += n;
        if let Some(Op::Delete { len }) = self.ops.last_mut() {
            *len += n;
            return self;
        }
        self.ops.push(Op::delete(n));
        self
    }

    /// Delete with a signed count; the sign is ignored.
    pub fn delete_signed(&mut self, n: isize) -> &mut Self {
        self.delete(n.unsigned_abs())
    }

    /// Append an op through the canonicalizing builders
    pub fn push(&mut self, op: Op) -> &mut Self {
        match op {
            Op::Insert { text, meta } => self.insert_with(&text, meta),
            Op::Retain { len, meta } => self.retain_with(len, meta),
            Op::Delete { len } => self.delete(len),
        }
    }

    /// Apply to a plain string. Metadata is ignored.
    pub fn apply(&self, text: &str) -> Result<String> {
        let chars: Vec<char> = text.chars().collect();
        if chars.len() != self.base_length {
            return Err(OtError::length_mismatch("apply", self.base_length, chars.len()));
        }

        let mut result = String::with_capacity(text.len());
        let mut index = 0;
        for op in &self.ops {
            match op {
                Op::Retain { len, .. } => {
                    result.extend(&chars[index..index + len]);
                    index += len;
                }
                Op::Insert { text, .. } => result.push_str(text),
                Op::Delete { len } => index += len,
            }
        }
        Ok(result)
    }

    /// Merge `self` followed by `other` into a single operation with the
    /// same effect.
    ///
    /// Where both touch the metadata of a span, attributes `other`
    /// specifies win and the rest of `self`'s survive.
    pub fn compose(&self, other: &Operation) -> Result<Operation> {
        if self.target_length != other.base_length {
            return Err(OtError::length_mismatch(
                "compose",
                self.target_length,
                other.base_length,
            ));
        }

        let mut result = Operation::new();
        let mut ops1 = self.ops.iter().cloned();
        let mut ops2 = other.ops.iter().cloned();
        let mut op1 = ops1.next();
        let mut op2 = ops2.next();

        loop {
            match (op1.take(), op2.take()) {
                (None, None) => break,
                // deletions of the first operation are unaffected by the second
                (Some(Op::Delete { len }), pending) => {
                    result.delete(len);
                    op1 = ops1.next();
                    op2 = pending;
                }
                // and insertions of the second are unaffected by the first
                (pending, Some(Op::Insert { text, meta })) => {
                    result.insert_with(&text, meta);
                    op1 = pending;
                    op2 = ops2.next();
                }
                (Some(a), Some(b)) => {
                    let n = a.len().min(b.len());
                    let (a_head, a_rest) = a.split(n);
                    let (b_head, b_rest) = b.split(n);
                    match (a_head, b_head) {
                        (Op::Retain { meta: m1, .. }, Op::Retain { meta: m2, .. }) => {
                            result.retain_with(n, m1.merge(&m2));
                        }
                        (Op::Insert { text, meta: m1 }, Op::Retain { meta: m2, .. }) => {
                            result.insert_with(&text, m1.merge(&m2));
                        }
                        (Op::Retain { .. }, Op::Delete { .. }) => {
                            result.delete(n);
                        }
                        // Insert/Delete cancel out
                        _ => {}
                    }
                    op1 = a_rest.or_else(|| ops1.next());
                    op2 = b_rest.or_else(|| ops2.next());
                }
                (Some(_), None) | (None, Some(_)) => {
                    return Err(OtError::length_mismatch(
                        "compose",
                        self.target_length,
                        other.base_length,
                    ));
                }
            }
        }

        Ok(result)
    }

    /// Transform two concurrent operations into `(a', b')` such that
    /// `apply(apply(S, a), b') == apply(apply(S, b), a')`.
    ///
    /// Ties between inserts at the same position go to `a`. Over spans
    /// both retain, each primed operation carries its own side's
    /// attribute change; `b'` drops the attributes `a` also sets so `a`
    /// wins attribute conflicts too.
    pub fn transform(a: &Operation, b: &Operation) -> Result<(Operation, Operation)> {
        if a.base_length != b.base_length {
            return Err(OtError::length_mismatch(
                "transform",
                a.base_length,
                b.base_length,
            ));
        }

        let mut a_prime = Operation::new();
        let mut b_prime = Operation::new();
        let mut ops1 = a.ops.iter().cloned();
        let mut ops2 = b.ops.iter().cloned();
        let mut op1 = ops1.next();
        let mut op2 = ops2.next();

        loop {
            match (op1.take(), op2.take()) {
                (None, None) => break,
                (Some(Op::Insert { text, meta }), pending) => {
                    b_prime.retain(text.chars().count());
                    a_prime.insert_with(&text, meta);
                    op1 = ops1.next();
                    op2 = pending;
                }
                (pending, Some(Op::Insert { text, meta })) => {
                    a_prime.retain(text.chars().count());
                    b_prime.insert_with(&text, meta);
                    op1 = pending;
                    op2 = ops2.next();
                }
                (Some(x), Some(y)) => {
                    let n = x.len().min(y.len());
                    let (x_head, x_rest) = x.split(n);
                    let (y_head, y_rest) = y.split(n);
                    match (x_head, y_head) {
                        (Op::Retain { meta: m1, .. }, Op::Retain { meta: m2, .. }) => {
                            a_prime.retain_with(n, m1);
                            b_prime.retain_with(n, m2.without(&m1));
                        }
                        (Op::Delete { .. }, Op::Retain { .. }) => {
                            a_prime.delete(n);
                        }
                        (Op::Retain { .. }, Op::Delete { .. }) => {
                            b_prime.delete(n);
                        }
                        // Delete/Delete: the span is gone either way
                        _ => {}
                    }
                    op1 = x_rest.or_else(|| ops1.next());
                    op2 = y_rest.or_else(|| ops2.next());
                }
                (Some(_), None) | (None, Some(_)) => {
                    return Err(OtError::length_mismatch(
                        "transform",
                        a.base_length,
                        b.base_length,
                    ));
                }
            }
        }

        Ok((a_prime, b_prime))
    }

    /// The operation that reverts `self` when applied to its result.
    ///
    /// `original` is the pre-edit text; deleted content is read back from
    /// it. Retains keep their metadata as-is.
    pub fn invert(&self, original: &str) -> Result<Operation> {
        let chars: Vec<char> = original.chars().collect();
        if chars.len() != self.base_length {
            return Err(OtError::length_mismatch("invert", self.base_length, chars.len()));
        }

        let mut inverse = Operation::new();
        let mut index = 0;
        for op in &self.ops {
            match op {
                Op::Retain { len, meta } => {
                    inverse.retain_with(*len, *meta);
                    index += len;
                }
                Op::Insert { text, .. } => {
                    inverse.delete(text.chars().count());
                }
                Op::Delete { len } => {
                    let removed: String = chars[index..index + len].iter().collect();
                    inverse.insert(&removed);
                    index += len;
                }
            }
        }
        Ok(inverse)
    }

    /// Invert against a rich snapshot of the pre-edit document.
    ///
    /// `snapshot` is an insert-only operation whose inserts spell out the
    /// document together with its attributes. Deleted text comes back with
    /// its original attributes and formatting retains restore the values
    /// the span had before.
    pub fn invert_against(&self, snapshot: &Operation) -> Result<Operation> {
        if snapshot.base_length != 0 {
            return Err(OtError::length_mismatch(
                "invert_against snapshot",
                0,
                snapshot.base_length,
            ));
        }
        if snapshot.target_length != self.base_length {
            return Err(OtError::length_mismatch(
                "invert_against",
                self.base_length,
                snapshot.target_length,
            ));
        }

        let mut inverse = Operation::new();
        let mut spans = snapshot.ops.iter().cloned();
        let mut pending = spans.next();

        for op in &self.ops {
            let (mut remaining, change) = match op {
                Op::Insert { text, .. } => {
                    inverse.delete(text.chars().count());
                    continue;
                }
                Op::Retain { len, meta } => (*len, Some(meta)),
                Op::Delete { len } => (*len, None),
            };

            while remaining > 0 {
                let span = pending.take().ok_or_else(|| {
                    OtError::length_mismatch(
                        "invert_against",
                        self.base_length,
                        snapshot.target_length,
                    )
                })?;
                let (head, rest) = span.split(remaining);
                pending = rest.or_else(|| spans.next());

                let Op::Insert { text, meta: prior } = head else {
                    return Err(OtError::length_mismatch(
                        "invert_against snapshot",
                        0,
                        snapshot.base_length,
                    ));
                };
                let len = text.chars().count();
                remaining -= len;
                match change {
                    Some(meta) => inverse.retain_with(len, meta.restore_from(&prior)),
                    None => inverse.insert_with(&text, prior),
                };
            }
        }
        Ok(inverse)
    }

    /// Move a document index through this operation.
    ///
    /// Text inserted at exactly `index` pushes it right; an index inside a
    /// deleted span collapses to the start of the deletion.
    pub fn transform_index(&self, index: usize) -> usize {
        let mut remaining = index as isize;
        let mut new_index = index;
        for op in &self.ops {
            if remaining < 0 {
                break;
            }
            match op {
                Op::Retain { len, .. } => remaining -= *len as isize,
                Op::Insert { text, .. } => new_index += text.chars().count(),
                Op::Delete { len } => {
                    new_index -= (*len).min(remaining.max(0) as usize);
                    remaining -= *len as isize;
                }
            }
        }
        new_index
    }

    /// Whether `other`, produced right after `self`, belongs to the same
    /// undo step: contiguous typing, or a run of backspace / delete-key
    /// presses. You may want to add other factors, such as the time
    /// elapsed since the last change.
    pub fn should_be_composed_with(&self, other: &Operation) -> bool {
        if self.is_noop() || other.is_noop() {
            return true;
        }

        let (Some(simple_a), Some(simple_b)) = (self.simple_op(), other.simple_op()) else {
            return false;
        };
        let start_a = self.start_index();
        let start_b = other.start_index();

        match (simple_a, simple_b) {
            (Op::Insert { .. }, Op::Insert { .. }) => start_a + simple_a.len() == start_b,
            (Op::Delete { .. }, Op::Delete { .. }) => {
                // backspace, or the delete key
                start_b + simple_b.len() == start_a || start_a == start_b
            }
            _ => false,
        }
    }

    /// Same decision for inverted operations:
    /// `a.should_be_composed_with(b) == b⁻¹.should_be_composed_with_inverted(a⁻¹)`.
    pub fn should_be_composed_with_inverted(&self, other: &Operation) -> bool {
        if self.is_noop() || other.is_noop() {
            return true;
        }

        let (Some(simple_a), Some(simple_b)) = (self.simple_op(), other.simple_op()) else {
            return false;
        };
        let start_a = self.start_index();
        let start_b = other.start_index();

        match (simple_a, simple_b) {
            (Op::Insert { .. }, Op::Insert { .. }) => {
                start_a + simple_a.len() == start_b || start_a == start_b
            }
            (Op::Delete { .. }, Op::Delete { .. }) => start_b + simple_b.len() == start_a,
            _ => false,
        }
    }

    /// The single interesting op, tolerating one leading and/or trailing
    /// retain
    fn simple_op(&self) -> Option<&Op> {
        match self.ops.as_slice() {
            [op] => Some(op),
            [Op::Retain { .. }, op] | [op, Op::Retain { .. }] => Some(op),
            [Op::Retain { .. }, op, Op::Retain { .. }] => Some(op),
            _ => None,
        }
    }

    fn start_index(&self) -> usize {
        match self.ops.first() {
            Some(Op::Retain { len, .. }) => *len,
            _ => 0,
        }
    }
}

impl FromIterator<Op> for Operation {
    fn from_iter<I: IntoIterator<Item = Op>>(iter: I) -> Self {
        let mut operation = Operation::new();
        for op in iter {
            operation.push(op);
        }
        operation
    }
}
