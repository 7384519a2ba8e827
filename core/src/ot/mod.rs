//! Operational-transform algebra
//!
//! This module contains the document model the rest of the crate is built
//! on: edits are expressed as [`Operation`]s over a linear text, and
//! concurrent edits are reconciled with [`Operation::transform`] instead of
//! locking the document.
//!
//! # Guarantees
//!
//! - **Associativity:** `a.compose(b).compose(c) == a.compose(b.compose(c))`
//! - **Convergence:** applying `a` then `b'` equals applying `b` then `a'`
//!   for `(a', b') = transform(a, b)`
//! - **Canonical equality:** operations with the same effect compare equal
//!
//! # References
//!
//! - Ellis & Gibbs, "Concurrency Control in Groupware Systems" (1989)
//! - Nichols et al., "High-Latency, Low-Bandwidth Windowing in the Jupiter
//!   Collaboration System" (1995)

pub mod meta;
pub mod op;
pub mod operation;
pub mod selection;

pub use meta::{Attribute, Meta, Style, UserId};
pub use op::Op;
pub use operation::Operation;
pub use selection::{Range, Selection};
