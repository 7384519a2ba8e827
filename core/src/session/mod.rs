//! Client side of the revision protocol
//!
//! The authority assigns every committed operation the next revision
//! number and broadcasts it. A client keeps at most one operation in
//! flight, rebases incoming operations over its pending edits, and
//! re-requests the whole document when it falls out of step.

pub mod client;
pub mod editor;

pub use client::{Client, ClientState, Outbound};
pub use editor::EditorClient;
