//! Cursor and selection state in document indices

use super::operation::Operation;
use serde::{Deserialize, Serialize};

/// A single range; `anchor == head` is a cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub anchor: usize,
    pub head: usize,
}

impl Range {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    pub fn cursor(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }

    /// Lower end, regardless of direction
    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    /// Upper end, regardless of direction
    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    /// Move both ends through `operation`
    pub fn transform(&self, operation: &Operation) -> Range {
        let anchor = operation.transform_index(self.anchor);
        if self.is_empty() {
            return Range::cursor(anchor);
        }
        Range::new(anchor, operation.transform_index(self.head))
    }
}

/// Ordered set of ranges
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub ranges: Vec<Range>,
}

impl Selection {
    pub fn new(ranges: Vec<Range>) -> Self {
        Self { ranges }
    }

    /// A single cursor at `pos`
    pub fn cursor(pos: usize) -> Self {
        Self::new(vec![Range::cursor(pos)])
    }

    pub fn something_selected(&self) -> bool {
        self.ranges.iter().any(|range| !range.is_empty())
    }

    pub fn transform(&self, operation: &Operation) -> Selection {
        Selection::new(
            self.ranges
                .iter()
                .map(|range| range.transform(operation))
                .collect(),
        )
    }
}
