//! Coedit Core - operational transformation for collaborative rich text
//!
//! This is the Rust core of Coedit, compiled to both native and WASM.
//! It implements:
//! - Attributed text operations with compose, transform and invert
//! - An editor binding that turns surface change batches into operations
//!   and applies remote operations back, annotations included
//! - Undo/redo that survives concurrent remote edits
//! - Remote selections and presence
//! - The revision protocol (JSON wire format, optional protobuf)
//!
//! # Examples
//!
//! ```rust
//! use coedit_core::{Operation, Meta, Style};
//!
//! let mut a = Operation::new();
//! a.retain(5).insert_with("!", Meta::styled(Style::Bold, true));
//! let mut b = Operation::new();
//! b.insert(">> ").retain(5);
//!
//! let (a_prime, b_prime) = Operation::transform(&a, &b).unwrap();
//! let left = b_prime.apply(&a.apply("hello").unwrap()).unwrap();
//! let right = a_prime.apply(&b.apply("hello").unwrap()).unwrap();
//! assert_eq!(left, right);
//! assert_eq!(left, ">> hello!");
//! ```

pub mod binding;
pub mod config;
pub mod error;
pub mod ot;
pub mod presence;
pub mod protocol;
pub mod session;
pub mod undo;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-exports for convenience
pub use binding::{EditorAdapter, RawChange, Surface};
pub use config::EditorConfig;
pub use error::{OtError, Result};
pub use ot::{Meta, Op, Operation, Range, Selection, Style, UserId};
pub use session::EditorClient;
pub use undo::UndoManager;

/// Client identifier type
pub type ClientID = String;
