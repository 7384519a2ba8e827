//! Op: the atomic edit primitive
//!
//! Lengths are counted in Unicode scalar values (`char`s), the unit every
//! index in this crate uses.

use super::meta::Meta;
use serde::{Deserialize, Serialize};

/// One step of an [`Operation`](super::Operation)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Op {
    /// Insert `text` at the cursor
    Insert { text: String, meta: Meta },
    /// Skip `len` characters, optionally re-tagging them with `meta`
    Retain { len: usize, meta: Meta },
    /// Remove the next `len` characters
    Delete { len: usize },
}

impl Op {
    pub fn insert(text: impl Into<String>, meta: Meta) -> Self {
        Op::Insert {
            text: text.into(),
            meta,
        }
    }

    pub fn retain(len: usize, meta: Meta) -> Self {
        Op::Retain { len, meta }
    }

    pub fn delete(len: usize) -> Self {
        Op::Delete { len }
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        match self {
            Op::Insert { text, .. } => text.chars().count(),
            Op::Retain { len, .. } | Op::Delete { len } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Op::Insert { text, .. } => text.is_empty(),
            Op::Retain { len, .. } | Op::Delete { len } => *len == 0,
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Op::Insert { .. })
    }

    pub fn is_retain(&self) -> bool {
        matches!(self, Op::Retain { .. })
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Op::Delete { .. })
    }

    /// Metadata of Insert/Retain ops; Delete carries none
    pub fn meta(&self) -> Option<&Meta> {
        match self {
            Op::Insert { meta, .. } | Op::Retain { meta, .. } => Some(meta),
            Op::Delete { .. } => None,
        }
    }

    /// Split off the first `n` characters.
    ///
    /// Returns the head of length `min(n, len)` and the remainder, if any.
    /// The op itself is consumed; callers keep the remainder as the new
    /// pending op instead of shortening a shared value in place.
    pub fn split(self, n: usize) -> (Op, Option<Op>) {
        if n >= self.len() {
            return (self, None);
        }
        match self {
            Op::Insert { text, meta } => {
                let (head, tail) = split_chars(&text, n);
                (Op::insert(head, meta), Some(Op::insert(tail, meta)))
            }
            Op::Retain { len, meta } => (Op::retain(n, meta), Some(Op::retain(len - n, meta))),
            Op::Delete { len } => (Op::delete(n), Some(Op::delete(len - n))),
        }
    }
}

/// Split a string after `n` characters
pub(crate) fn split_chars(text: &str, n: usize) -> (&str, &str) {
    match text.char_indices().nth(n) {
        Some((byte, _)) => text.split_at(byte),
        None => (text, ""),
    }
}

/// Characters `[from, from + len)` of `text`
pub(crate) fn slice_chars(text: &str, from: usize, len: usize) -> &str {
    let (_, rest) = split_chars(text, from);
    split_chars(rest, len).0
}
