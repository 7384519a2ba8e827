//! Editor binding: bridges a line/column editing surface and the
//! index-based operation model
//!
//! - **Local edits:** the surface's change batch is replayed into an
//!   [`Operation`](crate::ot::Operation) and its inverse
//! - **Remote edits:** operations are applied back onto the surface, text
//!   and attribute annotations alike
//! - **Formatting:** [`toggle_meta`] builds permission-aware style deltas
//! - **Presence:** remote selections are drawn as markers that must be
//!   disposed before being redrawn

pub mod adapter;
pub mod apply;
pub mod changes;
pub mod remote;
pub mod surface;
pub mod toggle;

#[cfg(feature = "memory-surface")]
pub mod memory;

pub use adapter::EditorAdapter;
pub use apply::{apply_operation, snapshot};
pub use changes::operation_from_changes;
pub use remote::RemoteRendering;
pub use surface::{Mark, MarkId, MarkerId, Pos, RawChange, Surface};
pub use toggle::{toggle_meta, ToggleOutcome};

#[cfg(feature = "memory-surface")]
pub use memory::MemorySurface;
